use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::UserSession;
use crate::error::{AppError, AppResult};
use crate::models::{CreateExerciseRequest, Exercise, ExerciseQuery, UpdateExerciseRequest};
use crate::services::access;

const EXERCISE_COLUMNS: &str = "id, name, description, category, difficulty, muscle_groups, \
     equipment, instructions, video_url, created_by, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ExerciseService {
    db: PgPool,
}

impl ExerciseService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_exercises(&self, query: &ExerciseQuery) -> AppResult<Vec<Exercise>> {
        let limit = query.limit.unwrap_or(200).clamp(1, 1000);
        let offset = query.offset.unwrap_or(0).max(0);

        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM exercises WHERE TRUE",
            EXERCISE_COLUMNS
        ));

        if let Some(category) = query.category.as_deref() {
            builder.push(" AND LOWER(category) = LOWER(").push_bind(category.to_string()).push(")");
        }
        if let Some(difficulty) = query.difficulty {
            builder.push(" AND difficulty = ").push_bind(difficulty);
        }
        if let Some(muscle_group) = query.muscle_group.as_deref() {
            builder.push(" AND ").push_bind(muscle_group.to_string()).push(" = ANY(muscle_groups)");
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            builder.push(" AND name ILIKE ").push_bind(format!("%{}%", search.trim()));
        }

        builder
            .push(" ORDER BY name LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let exercises = builder.build_query_as::<Exercise>().fetch_all(&self.db).await?;
        Ok(exercises)
    }

    pub async fn get_exercise(&self, exercise_id: Uuid) -> AppResult<Exercise> {
        sqlx::query_as::<_, Exercise>(&format!(
            "SELECT {} FROM exercises WHERE id = $1",
            EXERCISE_COLUMNS
        ))
        .bind(exercise_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Exercise"))
    }

    /// Case-insensitive name lookup, used by the CSV importers
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Exercise>> {
        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            "SELECT {} FROM exercises WHERE LOWER(name) = LOWER($1) ORDER BY created_at LIMIT 1",
            EXERCISE_COLUMNS
        ))
        .bind(name.trim())
        .fetch_optional(&self.db)
        .await?;

        Ok(exercise)
    }

    /// Ids among `ids` with no exercise row
    pub async fn missing_ids(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM exercises WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.db)
            .await?;

        let mut missing: Vec<Uuid> = ids.iter().filter(|id| !found.contains(id)).copied().collect();
        missing.sort();
        missing.dedup();
        Ok(missing)
    }

    pub async fn ensure_exist(&self, ids: &[Uuid]) -> AppResult<()> {
        let missing = self.missing_ids(ids).await?;
        if missing.is_empty() {
            return Ok(());
        }

        let missing: Vec<String> = missing.iter().map(Uuid::to_string).collect();
        Err(AppError::Validation(format!("Unknown exercise ids: {}", missing.join(", "))))
    }

    pub async fn create_exercise(
        &self,
        created_by: Option<Uuid>,
        request: CreateExerciseRequest,
    ) -> AppResult<Exercise> {
        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            "INSERT INTO exercises (
                name, description, category, difficulty, muscle_groups,
                equipment, instructions, video_url, created_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {}",
            EXERCISE_COLUMNS
        ))
        .bind(request.name.trim())
        .bind(request.description)
        .bind(request.category.trim())
        .bind(request.difficulty)
        .bind(request.muscle_groups)
        .bind(request.equipment)
        .bind(request.instructions)
        .bind(request.video_url)
        .bind(created_by)
        .fetch_one(&self.db)
        .await?;

        Ok(exercise)
    }

    pub async fn update_exercise(
        &self,
        session: &UserSession,
        exercise_id: Uuid,
        request: UpdateExerciseRequest,
    ) -> AppResult<Exercise> {
        let existing = self.get_exercise(exercise_id).await?;
        if !access::can_modify(session, existing.created_by) {
            return Err(AppError::Forbidden("Only the creator or an admin can edit this exercise".to_string()));
        }

        let exercise = sqlx::query_as::<_, Exercise>(&format!(
            "UPDATE exercises SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                difficulty = COALESCE($5, difficulty),
                muscle_groups = COALESCE($6, muscle_groups),
                equipment = COALESCE($7, equipment),
                instructions = COALESCE($8, instructions),
                video_url = COALESCE($9, video_url),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            EXERCISE_COLUMNS
        ))
        .bind(exercise_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.category)
        .bind(request.difficulty)
        .bind(request.muscle_groups)
        .bind(request.equipment)
        .bind(request.instructions)
        .bind(request.video_url)
        .fetch_one(&self.db)
        .await?;

        Ok(exercise)
    }

    /// Exercises still used by a workout or program day cannot be removed
    pub async fn delete_exercise(&self, session: &UserSession, exercise_id: Uuid) -> AppResult<()> {
        let existing = self.get_exercise(exercise_id).await?;
        if !access::can_modify(session, existing.created_by) {
            return Err(AppError::Forbidden("Only the creator or an admin can delete this exercise".to_string()));
        }

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workout_exercises WHERE exercise_id = $1)
                 OR EXISTS (SELECT 1 FROM workout_day_exercises WHERE exercise_id = $1)",
        )
        .bind(exercise_id)
        .fetch_one(&self.db)
        .await?;

        if in_use {
            return Err(AppError::Conflict(
                "Exercise is used by a workout or program and cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(exercise_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
