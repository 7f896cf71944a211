use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::UserSession;
use crate::error::{AppError, AppResult};
use crate::models::{
    check_program_days, CreateProgramRequest, ProgramDetail, ProgramQuery, UpdateProgramRequest,
    UpsertDayRequest, WorkoutDay, WorkoutDayDetail, WorkoutDayInput, WorkoutProgram,
};
use crate::services::workout_service::{insert_entries, load_entries, EntryTable};
use crate::services::{access, ExerciseService};

const PROGRAM_COLUMNS: &str = "id, name, description, creator_id, total_days, is_public, \
     difficulty, created_at, updated_at";

const DAY_COLUMNS: &str = "id, program_id, day_number, name, is_rest_day, estimated_duration, notes";

async fn insert_day(
    conn: &mut PgConnection,
    program_id: Uuid,
    day: &WorkoutDayInput,
) -> Result<WorkoutDay, sqlx::Error> {
    let inserted = sqlx::query_as::<_, WorkoutDay>(&format!(
        "INSERT INTO workout_days (program_id, day_number, name, is_rest_day, estimated_duration, notes)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {}",
        DAY_COLUMNS
    ))
    .bind(program_id)
    .bind(day.day_number)
    .bind(&day.name)
    .bind(day.is_rest_day)
    .bind(day.estimated_duration)
    .bind(&day.notes)
    .fetch_one(&mut *conn)
    .await?;

    // a rest day keeps no entries even if some were sent
    if !day.is_rest_day {
        insert_entries(conn, EntryTable::ProgramDay, inserted.id, &day.exercises).await?;
    }

    Ok(inserted)
}

fn exercise_ids<'a>(days: impl IntoIterator<Item = &'a WorkoutDayInput>) -> Vec<Uuid> {
    days.into_iter()
        .flat_map(|day| day.exercises.iter().map(|e| e.exercise_id))
        .collect()
}

#[derive(Debug, Clone)]
pub struct ProgramService {
    db: PgPool,
    exercises: ExerciseService,
}

impl ProgramService {
    pub fn new(db: PgPool) -> Self {
        Self {
            exercises: ExerciseService::new(db.clone()),
            db,
        }
    }

    pub async fn list_programs(
        &self,
        session: &UserSession,
        query: &ProgramQuery,
    ) -> AppResult<Vec<WorkoutProgram>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM workout_programs WHERE TRUE",
            PROGRAM_COLUMNS
        ));

        if query.mine.unwrap_or(false) {
            builder.push(" AND creator_id = ").push_bind(session.user_id);
        } else if !session.is_admin() {
            builder
                .push(" AND (is_public OR creator_id = ")
                .push_bind(session.user_id)
                .push(")");
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            builder.push(" AND name ILIKE ").push_bind(format!("%{}%", search.trim()));
        }
        builder.push(" ORDER BY name, id");

        let programs = builder
            .build_query_as::<WorkoutProgram>()
            .fetch_all(&self.db)
            .await?;
        Ok(programs)
    }

    async fn find_program(&self, program_id: Uuid) -> AppResult<WorkoutProgram> {
        sqlx::query_as::<_, WorkoutProgram>(&format!(
            "SELECT {} FROM workout_programs WHERE id = $1",
            PROGRAM_COLUMNS
        ))
        .bind(program_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Program"))
    }

    /// Program with every stored day and its entries, regardless of who asks
    pub async fn fetch_detail(&self, program_id: Uuid) -> AppResult<ProgramDetail> {
        let program = self.find_program(program_id).await?;

        let days = sqlx::query_as::<_, WorkoutDay>(&format!(
            "SELECT {} FROM workout_days WHERE program_id = $1 ORDER BY day_number",
            DAY_COLUMNS
        ))
        .bind(program_id)
        .fetch_all(&self.db)
        .await?;

        let day_ids: Vec<Uuid> = days.iter().map(|d| d.id).collect();
        let mut entries = load_entries(&self.db, EntryTable::ProgramDay, &day_ids).await?;

        let days = days
            .into_iter()
            .map(|day| WorkoutDayDetail {
                exercises: entries.remove(&day.id).unwrap_or_default(),
                day,
            })
            .collect();

        Ok(ProgramDetail { program, days })
    }

    pub async fn get_program(
        &self,
        session: &UserSession,
        program_id: Uuid,
    ) -> AppResult<ProgramDetail> {
        let detail = self.fetch_detail(program_id).await?;
        if !access::can_view(session, detail.program.creator_id, detail.program.is_public) {
            return Err(AppError::not_found("Program"));
        }
        Ok(detail)
    }

    async fn editable_program(
        &self,
        session: &UserSession,
        program_id: Uuid,
    ) -> AppResult<WorkoutProgram> {
        let program = self.find_program(program_id).await?;
        if !access::can_view(session, program.creator_id, program.is_public) {
            return Err(AppError::not_found("Program"));
        }
        if !access::can_modify(session, Some(program.creator_id)) {
            return Err(AppError::Forbidden("Only the creator or an admin can edit this program".to_string()));
        }
        Ok(program)
    }

    pub async fn create_program(
        &self,
        creator_id: Uuid,
        request: CreateProgramRequest,
    ) -> AppResult<ProgramDetail> {
        check_program_days(request.total_days, &request.days).map_err(AppError::Validation)?;
        self.exercises.ensure_exist(&exercise_ids(&request.days)).await?;

        let mut tx = self.db.begin().await?;

        let program = sqlx::query_as::<_, WorkoutProgram>(&format!(
            "INSERT INTO workout_programs (name, description, creator_id, total_days, is_public, difficulty)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            PROGRAM_COLUMNS
        ))
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(creator_id)
        .bind(request.total_days)
        .bind(request.is_public)
        .bind(request.difficulty)
        .fetch_one(&mut *tx)
        .await?;

        for day in &request.days {
            insert_day(&mut tx, program.id, day).await?;
        }

        tx.commit().await?;

        tracing::debug!(program_id = %program.id, days = request.days.len(), "program created");
        self.fetch_detail(program.id).await
    }

    /// Updates program fields. Shrinking `total_days` drops the days past the new end.
    pub async fn update_program(
        &self,
        session: &UserSession,
        program_id: Uuid,
        request: UpdateProgramRequest,
    ) -> AppResult<ProgramDetail> {
        self.editable_program(session, program_id).await?;

        let mut tx = self.db.begin().await?;

        let program = sqlx::query_as::<_, WorkoutProgram>(&format!(
            "UPDATE workout_programs SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                total_days = COALESCE($4, total_days),
                is_public = COALESCE($5, is_public),
                difficulty = COALESCE($6, difficulty),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PROGRAM_COLUMNS
        ))
        .bind(program_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.total_days)
        .bind(request.is_public)
        .bind(request.difficulty)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM workout_days WHERE program_id = $1 AND day_number > $2")
            .bind(program_id)
            .bind(program.total_days)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.fetch_detail(program_id).await
    }

    /// Replaces one day of a program (and its entries) wholesale
    pub async fn upsert_day(
        &self,
        session: &UserSession,
        program_id: Uuid,
        day_number: i32,
        request: UpsertDayRequest,
    ) -> AppResult<WorkoutDayDetail> {
        let program = self.editable_program(session, program_id).await?;

        let day = request.into_day_input(day_number);
        check_program_days(program.total_days, std::slice::from_ref(&day)).map_err(AppError::Validation)?;
        self.exercises.ensure_exist(&exercise_ids([&day])).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM workout_days WHERE program_id = $1 AND day_number = $2")
            .bind(program_id)
            .bind(day_number)
            .execute(&mut *tx)
            .await?;
        let stored = insert_day(&mut tx, program_id, &day).await?;

        tx.commit().await?;

        let mut entries = load_entries(&self.db, EntryTable::ProgramDay, &[stored.id]).await?;
        Ok(WorkoutDayDetail {
            exercises: entries.remove(&stored.id).unwrap_or_default(),
            day: stored,
        })
    }

    /// Removes the program, its days and every assignment of it
    pub async fn delete_program(&self, session: &UserSession, program_id: Uuid) -> AppResult<()> {
        self.editable_program(session, program_id).await?;

        sqlx::query("DELETE FROM workout_programs WHERE id = $1")
            .bind(program_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%program_id, deleted_by = %session.user_id, "program deleted");
        Ok(())
    }
}
