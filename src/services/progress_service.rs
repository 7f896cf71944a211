use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{UserRole, UserSession};
use crate::error::{AppError, AppResult};
use crate::models::{CreateProgressRequest, ProgressEntry, ProgressQuery};
use crate::services::ClientService;

const PROGRESS_COLUMNS: &str = "id, client_id, client_workout_id, exercise_id, date, sets, reps, \
     weight, duration_seconds, notes, created_at";

#[derive(Debug, Clone)]
pub struct ProgressService {
    db: PgPool,
    clients: ClientService,
}

impl ProgressService {
    pub fn new(db: PgPool) -> Self {
        Self {
            clients: ClientService::new(db.clone()),
            db,
        }
    }

    /// Clients log against themselves; an explicit other client id is a 404
    async fn target_client(
        &self,
        session: &UserSession,
        client_id: Option<Uuid>,
    ) -> AppResult<Uuid> {
        if session.role == UserRole::Client {
            let own = self.clients.own_client(session).await?;
            return match client_id {
                Some(id) if id != own.id => Err(AppError::not_found("Client")),
                _ => Ok(own.id),
            };
        }
        Ok(self.clients.resolve_client(session, client_id).await?.id)
    }

    pub async fn record_progress(
        &self,
        session: &UserSession,
        request: CreateProgressRequest,
    ) -> AppResult<ProgressEntry> {
        let client_id = self.target_client(session, request.client_id).await?;

        if let Some(client_workout_id) = request.client_workout_id {
            let owner: Option<Uuid> =
                sqlx::query_scalar("SELECT client_id FROM client_workouts WHERE id = $1")
                    .bind(client_workout_id)
                    .fetch_optional(&self.db)
                    .await?;
            if owner != Some(client_id) {
                return Err(AppError::not_found("Assignment"));
            }
        }

        let entry = sqlx::query_as::<_, ProgressEntry>(&format!(
            "INSERT INTO progress_entries (
                client_id, client_workout_id, exercise_id, date, sets, reps,
                weight, duration_seconds, notes
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            PROGRESS_COLUMNS
        ))
        .bind(client_id)
        .bind(request.client_workout_id)
        .bind(request.exercise_id)
        .bind(request.date.date())
        .bind(request.sets)
        .bind(request.reps)
        .bind(request.weight)
        .bind(request.duration_seconds)
        .bind(request.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    pub async fn list_progress(
        &self,
        session: &UserSession,
        query: &ProgressQuery,
    ) -> AppResult<Vec<ProgressEntry>> {
        let client_id = self.target_client(session, query.client_id).await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM progress_entries WHERE client_id = ",
            PROGRESS_COLUMNS
        ));
        builder.push_bind(client_id);

        if let Some(exercise_id) = query.exercise_id {
            builder.push(" AND exercise_id = ").push_bind(exercise_id);
        }
        if let Some(from) = &query.from {
            builder.push(" AND date >= ").push_bind(from.date());
        }
        if let Some(to) = &query.to {
            builder.push(" AND date <= ").push_bind(to.date());
        }
        builder.push(" ORDER BY date DESC, created_at DESC");

        let entries = builder.build_query_as::<ProgressEntry>().fetch_all(&self.db).await?;
        Ok(entries)
    }
}
