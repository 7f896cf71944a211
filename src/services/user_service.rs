use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{hash_password, AuthError, UserRole};
use crate::error::AppResult;
use crate::models::{CreateUser, User, UserQuery};

const USER_COLUMNS: &str = "id, email, name, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates the account and, for clients, the client profile in one transaction
    pub async fn create_user(&self, request: CreateUser) -> Result<User, AuthError> {
        let email = request.email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password, &email)?;

        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(request.name.trim())
        .bind(&password_hash)
        .bind(request.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AuthError::EmailAlreadyExists
            }
            _ => AuthError::Database(err),
        })?;

        if user.role == UserRole::Client {
            sqlx::query("INSERT INTO clients (user_id) VALUES ($1)")
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.db)
        .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn list_users(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let limit = query.limit.unwrap_or(100).clamp(1, 500);
        let offset = query.offset.unwrap_or(0).max(0);

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS));
        if let Some(role) = query.role {
            builder.push(" AND role = ").push_bind(role);
        }
        builder
            .push(" ORDER BY name, email LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let users = builder.build_query_as::<User>().fetch_all(&self.db).await?;
        Ok(users)
    }

    pub async fn list_trainers(&self) -> AppResult<Vec<User>> {
        self.list_users(&UserQuery {
            role: Some(UserRole::Trainer),
            ..UserQuery::default()
        })
        .await
    }
}
