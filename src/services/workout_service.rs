use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::UserSession;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateWorkoutRequest, ExerciseEntry, ExerciseEntryInput, UpdateWorkoutRequest, Workout,
    WorkoutDetail, WorkoutQuery,
};
use crate::services::{access, ExerciseService};

const WORKOUT_COLUMNS: &str = "id, name, description, creator_id, is_public, difficulty, \
     estimated_duration, created_at, updated_at";

/// Tables holding ordered exercise entries
#[derive(Debug, Clone, Copy)]
pub(crate) enum EntryTable {
    Workout,
    ProgramDay,
}

impl EntryTable {
    fn table(self) -> &'static str {
        match self {
            EntryTable::Workout => "workout_exercises",
            EntryTable::ProgramDay => "workout_day_exercises",
        }
    }

    fn parent_column(self) -> &'static str {
        match self {
            EntryTable::Workout => "workout_id",
            EntryTable::ProgramDay => "day_id",
        }
    }
}

#[derive(FromRow)]
struct EntryRow {
    parent_id: Uuid,
    #[sqlx(flatten)]
    entry: ExerciseEntry,
}

/// Inserts entries in the given order, `order_index` starting at 0
pub(crate) async fn insert_entries(
    conn: &mut PgConnection,
    table: EntryTable,
    parent_id: Uuid,
    entries: &[ExerciseEntryInput],
) -> Result<(), sqlx::Error> {
    if entries.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "INSERT INTO {} ({}, exercise_id, order_index, sets, reps, rest_seconds, notes) ",
        table.table(),
        table.parent_column()
    ));
    builder.push_values(entries.iter().enumerate(), |mut row, (index, entry)| {
        row.push_bind(parent_id)
            .push_bind(entry.exercise_id)
            .push_bind(index as i32)
            .push_bind(entry.sets)
            .push_bind(entry.reps.clone())
            .push_bind(entry.rest_seconds)
            .push_bind(entry.notes.clone());
    });
    builder.build().execute(conn).await?;

    Ok(())
}

/// Entries of every parent in `parent_ids`, grouped by parent and ordered
pub(crate) async fn load_entries(
    db: &PgPool,
    table: EntryTable,
    parent_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ExerciseEntry>>, sqlx::Error> {
    let mut grouped: HashMap<Uuid, Vec<ExerciseEntry>> = HashMap::new();
    if parent_ids.is_empty() {
        return Ok(grouped);
    }

    let sql = format!(
        "SELECT x.{parent} AS parent_id, x.id, x.exercise_id, e.name AS exercise_name,
                x.order_index, x.sets, x.reps, x.rest_seconds, x.notes
         FROM {table} x
         JOIN exercises e ON e.id = x.exercise_id
         WHERE x.{parent} = ANY($1)
         ORDER BY x.{parent}, x.order_index",
        parent = table.parent_column(),
        table = table.table(),
    );

    let rows = sqlx::query_as::<_, EntryRow>(&sql)
        .bind(parent_ids)
        .fetch_all(db)
        .await?;

    for row in rows {
        grouped.entry(row.parent_id).or_default().push(row.entry);
    }

    Ok(grouped)
}

#[derive(Debug, Clone)]
pub struct WorkoutService {
    db: PgPool,
    exercises: ExerciseService,
}

impl WorkoutService {
    pub fn new(db: PgPool) -> Self {
        Self {
            exercises: ExerciseService::new(db.clone()),
            db,
        }
    }

    /// Admins see every workout; trainers their own plus public ones
    pub async fn list_workouts(
        &self,
        session: &UserSession,
        query: &WorkoutQuery,
    ) -> AppResult<Vec<Workout>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM workouts WHERE TRUE",
            WORKOUT_COLUMNS
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

        let workouts = builder.build_query_as::<Workout>().fetch_all(&self.db).await?;
        Ok(workouts)
    }

    async fn find_workout(&self, workout_id: Uuid) -> AppResult<Workout> {
        sqlx::query_as::<_, Workout>(&format!(
            "SELECT {} FROM workouts WHERE id = $1",
            WORKOUT_COLUMNS
        ))
        .bind(workout_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Workout"))
    }

    /// Workout with its entries, regardless of who asks.
    /// Callers reaching a workout through an assignment use this.
    pub async fn fetch_detail(&self, workout_id: Uuid) -> AppResult<WorkoutDetail> {
        let workout = self.find_workout(workout_id).await?;
        let mut entries = load_entries(&self.db, EntryTable::Workout, &[workout.id]).await?;

        Ok(WorkoutDetail {
            exercises: entries.remove(&workout.id).unwrap_or_default(),
            workout,
        })
    }

    pub async fn get_workout(
        &self,
        session: &UserSession,
        workout_id: Uuid,
    ) -> AppResult<WorkoutDetail> {
        let detail = self.fetch_detail(workout_id).await?;
        if !access::can_view(session, detail.workout.creator_id, detail.workout.is_public) {
            return Err(AppError::not_found("Workout"));
        }
        Ok(detail)
    }

    pub async fn create_workout(
        &self,
        creator_id: Uuid,
        request: CreateWorkoutRequest,
    ) -> AppResult<WorkoutDetail> {
        let exercise_ids: Vec<Uuid> = request.exercises.iter().map(|e| e.exercise_id).collect();
        self.exercises.ensure_exist(&exercise_ids).await?;

        let mut tx = self.db.begin().await?;

        let workout = sqlx::query_as::<_, Workout>(&format!(
            "INSERT INTO workouts (name, description, creator_id, is_public, difficulty, estimated_duration)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            WORKOUT_COLUMNS
        ))
        .bind(request.name.trim())
        .bind(&request.description)
        .bind(creator_id)
        .bind(request.is_public)
        .bind(request.difficulty)
        .bind(request.estimated_duration)
        .fetch_one(&mut *tx)
        .await?;

        insert_entries(&mut tx, EntryTable::Workout, workout.id, &request.exercises).await?;

        tx.commit().await?;

        tracing::debug!(workout_id = %workout.id, entries = request.exercises.len(), "workout created");
        self.fetch_detail(workout.id).await
    }

    pub async fn update_workout(
        &self,
        session: &UserSession,
        workout_id: Uuid,
        request: UpdateWorkoutRequest,
    ) -> AppResult<WorkoutDetail> {
        let existing = self.get_workout(session, workout_id).await?;
        if !access::can_modify(session, Some(existing.workout.creator_id)) {
            return Err(AppError::Forbidden("Only the creator or an admin can edit this workout".to_string()));
        }

        if let Some(entries) = &request.exercises {
            let exercise_ids: Vec<Uuid> = entries.iter().map(|e| e.exercise_id).collect();
            self.exercises.ensure_exist(&exercise_ids).await?;
        }

        let mut tx = self.db.begin().await?;

        sqlx::query(
            "UPDATE workouts SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_public = COALESCE($4, is_public),
                difficulty = COALESCE($5, difficulty),
                estimated_duration = COALESCE($6, estimated_duration),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(workout_id)
        .bind(request.name)
        .bind(request.description)
        .bind(request.is_public)
        .bind(request.difficulty)
        .bind(request.estimated_duration)
        .execute(&mut *tx)
        .await?;

        if let Some(entries) = &request.exercises {
            sqlx::query("DELETE FROM workout_exercises WHERE workout_id = $1")
                .bind(workout_id)
                .execute(&mut *tx)
                .await?;
            insert_entries(&mut tx, EntryTable::Workout, workout_id, entries).await?;
        }

        tx.commit().await?;

        self.fetch_detail(workout_id).await
    }

    /// Removes the workout, its entries and every assignment of it
    pub async fn delete_workout(&self, session: &UserSession, workout_id: Uuid) -> AppResult<()> {
        let existing = self.get_workout(session, workout_id).await?;
        if !access::can_modify(session, Some(existing.workout.creator_id)) {
            return Err(AppError::Forbidden("Only the creator or an admin can delete this workout".to_string()));
        }

        sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(workout_id)
            .execute(&self.db)
            .await?;

        tracing::info!(%workout_id, deleted_by = %session.user_id, "workout deleted");
        Ok(())
    }
}
