use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{UserRole, UserSession};
use crate::error::{AppError, AppResult};
use crate::models::{
    AssignTrainerRequest, Client, ClientProfile, ClientQuery, UpdateClientRequest,
    UpdateSubscriptionRequest,
};
use crate::services::access::{self, AccessScope};

const CLIENT_COLUMNS: &str = "id, user_id, trainer_id, subscription_status, subscription_plan, \
     subscription_start, subscription_end, goals, notes, created_at, updated_at";

const PROFILE_SELECT: &str = "SELECT c.id, c.user_id, c.trainer_id, c.subscription_status, \
     c.subscription_plan, c.subscription_start, c.subscription_end, c.goals, c.notes, \
     c.created_at, c.updated_at, u.name, u.email, t.name AS trainer_name \
     FROM clients c \
     JOIN users u ON u.id = c.user_id \
     LEFT JOIN users t ON t.id = c.trainer_id \
     WHERE TRUE";

#[derive(Debug, Clone)]
pub struct ClientService {
    db: PgPool,
}

impl ClientService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get_client(&self, client_id: Uuid) -> AppResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE id = $1",
            CLIENT_COLUMNS
        ))
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(client)
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> AppResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE user_id = $1",
            CLIENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(client)
    }

    /// Looks up a client and checks it against the session's scope; 404 either way
    pub async fn authorized_client(
        &self,
        session: &UserSession,
        client_id: Uuid,
    ) -> AppResult<Client> {
        let client = self.get_client(client_id).await?;
        access::authorize_client(session, client)
    }

    /// The requester's own client profile
    pub async fn own_client(&self, session: &UserSession) -> AppResult<Client> {
        self.get_by_user(session.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Client profile"))
    }

    /// Client the request is about: the explicit id for staff, the own profile for clients
    pub async fn resolve_client(
        &self,
        session: &UserSession,
        client_id: Option<Uuid>,
    ) -> AppResult<Client> {
        match client_id {
            Some(id) => self.authorized_client(session, id).await,
            None if session.role == UserRole::Client => self.own_client(session).await,
            None => Err(AppError::Validation("client_id is required".to_string())),
        }
    }

    pub async fn get_profile(
        &self,
        session: &UserSession,
        client_id: Uuid,
    ) -> AppResult<ClientProfile> {
        self.authorized_client(session, client_id).await?;
        self.fetch_profile(client_id).await
    }

    pub async fn own_profile(&self, session: &UserSession) -> AppResult<ClientProfile> {
        let client = self.own_client(session).await?;
        self.fetch_profile(client.id).await
    }

    async fn fetch_profile(&self, client_id: Uuid) -> AppResult<ClientProfile> {
        let mut builder = QueryBuilder::<Postgres>::new(PROFILE_SELECT);
        builder.push(" AND c.id = ").push_bind(client_id);

        builder
            .build_query_as::<ClientProfile>()
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Client"))
    }

    /// Clients visible to the requester. Trainers asking for `unassigned`
    /// get the pool they can claim from instead of their own list.
    pub async fn list_clients(
        &self,
        session: &UserSession,
        query: &ClientQuery,
    ) -> AppResult<Vec<ClientProfile>> {
        access::require_staff(session)?;

        let mut builder = QueryBuilder::<Postgres>::new(PROFILE_SELECT);
        let unassigned = query.unassigned.unwrap_or(false);

        if unassigned {
            builder.push(" AND c.trainer_id IS NULL");
        } else {
            AccessScope::for_session(session).push_filter(&mut builder, "c");
            if let Some(trainer_id) = query.trainer_id {
                builder.push(" AND c.trainer_id = ").push_bind(trainer_id);
            }
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            builder
                .push(" AND (u.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR u.email ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder.push(" ORDER BY u.name, c.id");

        let clients = builder
            .build_query_as::<ClientProfile>()
            .fetch_all(&self.db)
            .await?;

        Ok(clients)
    }

    pub async fn update_client(
        &self,
        session: &UserSession,
        client_id: Uuid,
        request: UpdateClientRequest,
    ) -> AppResult<ClientProfile> {
        let client = self.authorized_client(session, client_id).await?;
        // trainer notes are not the client's to edit
        if session.role == UserRole::Client && request.notes.is_some() {
            return Err(AppError::forbidden());
        }

        sqlx::query(
            "UPDATE clients SET
                goals = COALESCE($2, goals),
                notes = COALESCE($3, notes),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(client.id)
        .bind(request.goals)
        .bind(request.notes)
        .execute(&self.db)
        .await?;

        self.fetch_profile(client.id).await
    }

    /// Trainer takes an unassigned client. Already linked clients conflict.
    pub async fn claim_client(
        &self,
        session: &UserSession,
        client_id: Uuid,
    ) -> AppResult<ClientProfile> {
        if session.role != UserRole::Trainer {
            return Err(AppError::Forbidden("Only trainers can claim clients".to_string()));
        }

        let claimed = sqlx::query(
            "UPDATE clients SET trainer_id = $1, updated_at = NOW()
             WHERE id = $2 AND trainer_id IS NULL",
        )
        .bind(session.user_id)
        .bind(client_id)
        .execute(&self.db)
        .await?;

        if claimed.rows_affected() == 0 {
            return match self.get_client(client_id).await? {
                Some(client) if client.is_linked_to(session.user_id) => self.fetch_profile(client_id).await,
                Some(_) => Err(AppError::Conflict("Client already has a trainer".to_string())),
                None => Err(AppError::not_found("Client")),
            };
        }

        tracing::info!(%client_id, trainer_id = %session.user_id, "client claimed");
        self.fetch_profile(client_id).await
    }

    /// Unlinks a client: trainers only their own, admins any
    pub async fn release_client(
        &self,
        session: &UserSession,
        client_id: Uuid,
    ) -> AppResult<ClientProfile> {
        access::require_staff(session)?;
        let client = self.authorized_client(session, client_id).await?;

        sqlx::query("UPDATE clients SET trainer_id = NULL, updated_at = NOW() WHERE id = $1")
            .bind(client.id)
            .execute(&self.db)
            .await?;

        tracing::info!(%client_id, released_by = %session.user_id, "client released");
        self.fetch_profile(client.id).await
    }

    /// Admin reassignment; last write wins
    pub async fn assign_trainer(
        &self,
        client_id: Uuid,
        request: AssignTrainerRequest,
    ) -> AppResult<ClientProfile> {
        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(request.trainer_id)
            .fetch_optional(&self.db)
            .await?;

        if role != Some(UserRole::Trainer) {
            return Err(AppError::Validation("trainer_id does not belong to a trainer".to_string()));
        }

        let updated = sqlx::query("UPDATE clients SET trainer_id = $1, updated_at = NOW() WHERE id = $2")
            .bind(request.trainer_id)
            .bind(client_id)
            .execute(&self.db)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Client"));
        }

        tracing::info!(%client_id, trainer_id = %request.trainer_id, "trainer assigned");
        self.fetch_profile(client_id).await
    }

    pub async fn update_subscription(
        &self,
        client_id: Uuid,
        request: UpdateSubscriptionRequest,
    ) -> AppResult<ClientProfile> {
        let stored = self
            .get_client(client_id)
            .await?
            .ok_or_else(|| AppError::not_found("Client"))?;
        request.check_range(&stored).map_err(AppError::Validation)?;

        // unsent fields keep their stored values
        let updated = sqlx::query(
            "UPDATE clients SET
                subscription_status = $2,
                subscription_plan = COALESCE($3, subscription_plan),
                subscription_start = COALESCE($4, subscription_start),
                subscription_end = COALESCE($5, subscription_end),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(client_id)
        .bind(request.status)
        .bind(request.plan)
        .bind(request.start_date)
        .bind(request.end_date)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Client"));
        }

        self.fetch_profile(client_id).await
    }
}
