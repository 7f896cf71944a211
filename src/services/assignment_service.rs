use chrono::{NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{UserRole, UserSession};
use crate::error::{AppError, AppResult};
use crate::models::{
    AssignProgramRequest, AssignWorkoutRequest, AssignmentQuery, AssignmentStatus,
    BulkAssignResponse, ClientProgramView, ClientWorkout, ClientWorkoutProgram, ClientWorkoutView,
    DateFailure, UpdateProgramAssignmentRequest, UpdateWorkoutAssignmentRequest,
};
use crate::services::access::{self, AccessScope};
use crate::services::{schedule, ClientService, ProgramService, WorkoutService};

const WORKOUT_ASSIGNMENT_COLUMNS: &str = "id, client_id, workout_id, scheduled_date, status, \
     notes, assigned_by, completed_at, created_at, updated_at";

const PROGRAM_ASSIGNMENT_COLUMNS: &str = "id, client_id, program_id, start_date, status, notes, \
     assigned_by, created_at, updated_at";

const WORKOUT_VIEW_SELECT: &str = "SELECT cw.id, cw.client_id, cw.workout_id, cw.scheduled_date, \
     cw.status, cw.notes, cw.assigned_by, cw.completed_at, cw.created_at, cw.updated_at, \
     w.name AS workout_name, u.name AS client_name, c.trainer_id \
     FROM client_workouts cw \
     JOIN workouts w ON w.id = cw.workout_id \
     JOIN clients c ON c.id = cw.client_id \
     JOIN users u ON u.id = c.user_id \
     WHERE TRUE";

const PROGRAM_VIEW_SELECT: &str = "SELECT cwp.id, cwp.client_id, cwp.program_id, cwp.start_date, \
     cwp.status, cwp.notes, cwp.assigned_by, cwp.created_at, cwp.updated_at, \
     wp.name AS program_name, wp.total_days, u.name AS client_name, c.trainer_id \
     FROM client_workout_programs cwp \
     JOIN workout_programs wp ON wp.id = cwp.program_id \
     JOIN clients c ON c.id = cwp.client_id \
     JOIN users u ON u.id = c.user_id \
     WHERE TRUE";

/// `completed_at` after a status change: stamped on completion, cleared when leaving it
fn completion_stamp(
    current: Option<chrono::DateTime<Utc>>,
    new_status: Option<AssignmentStatus>,
) -> Option<chrono::DateTime<Utc>> {
    match new_status {
        None => current,
        Some(AssignmentStatus::Completed) => current.or_else(|| Some(Utc::now())),
        Some(_) => None,
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentService {
    db: PgPool,
    clients: ClientService,
    workouts: WorkoutService,
    programs: ProgramService,
}

impl AssignmentService {
    pub fn new(db: PgPool) -> Self {
        Self {
            clients: ClientService::new(db.clone()),
            workouts: WorkoutService::new(db.clone()),
            programs: ProgramService::new(db.clone()),
            db,
        }
    }

    /// Scope filter for a listing: an explicit client is authorized first
    async fn push_client_filter(
        &self,
        session: &UserSession,
        client_id: Option<Uuid>,
        builder: &mut QueryBuilder<'_, Postgres>,
    ) -> AppResult<()> {
        match client_id {
            Some(client_id) => {
                let client = self.clients.authorized_client(session, client_id).await?;
                builder.push(" AND c.id = ").push_bind(client.id);
            }
            None => AccessScope::for_session(session).push_filter(builder, "c"),
        }
        Ok(())
    }

    pub async fn list_workout_assignments(
        &self,
        session: &UserSession,
        query: &AssignmentQuery,
    ) -> AppResult<Vec<ClientWorkoutView>> {
        let mut builder = QueryBuilder::<Postgres>::new(WORKOUT_VIEW_SELECT);
        self.push_client_filter(session, query.client_id, &mut builder).await?;

        if let Some(status) = query.status {
            builder.push(" AND cw.status = ").push_bind(status);
        }
        if let Some(from) = &query.from {
            builder.push(" AND cw.scheduled_date >= ").push_bind(from.date());
        }
        if let Some(to) = &query.to {
            builder.push(" AND cw.scheduled_date <= ").push_bind(to.date());
        }
        builder.push(" ORDER BY cw.scheduled_date, cw.created_at, cw.id");

        let assignments = builder
            .build_query_as::<ClientWorkoutView>()
            .fetch_all(&self.db)
            .await?;
        Ok(assignments)
    }

    /// Program assignments; `from`/`to` match any overlap with the occupied dates
    pub async fn list_program_assignments(
        &self,
        session: &UserSession,
        query: &AssignmentQuery,
    ) -> AppResult<Vec<ClientProgramView>> {
        let mut builder = QueryBuilder::<Postgres>::new(PROGRAM_VIEW_SELECT);
        self.push_client_filter(session, query.client_id, &mut builder).await?;

        if let Some(status) = query.status {
            builder.push(" AND cwp.status = ").push_bind(status);
        }
        if let Some(from) = &query.from {
            builder
                .push(" AND cwp.start_date + (wp.total_days - 1) >= ")
                .push_bind(from.date());
        }
        if let Some(to) = &query.to {
            builder.push(" AND cwp.start_date <= ").push_bind(to.date());
        }
        builder.push(" ORDER BY cwp.start_date, cwp.created_at, cwp.id");

        let mut assignments = builder
            .build_query_as::<ClientProgramView>()
            .fetch_all(&self.db)
            .await?;

        for view in &mut assignments {
            view.end_date = schedule::program_end_date(view.assignment.start_date, view.total_days);
        }

        Ok(assignments)
    }

    /// Assigns a workout on one or many dates. Each date is inserted on its
    /// own; a failing date is reported and does not undo the others.
    pub async fn assign_workout(
        &self,
        session: &UserSession,
        request: AssignWorkoutRequest,
    ) -> AppResult<BulkAssignResponse> {
        access::require_staff(session)?;

        let dates = request.dates();
        if dates.is_empty() {
            return Err(AppError::Validation(
                "scheduled_date or scheduled_dates is required".to_string(),
            ));
        }

        let client = self.clients.authorized_client(session, request.client_id).await?;
        let workout = self.workouts.get_workout(session, request.workout_id).await?;

        let mut response = BulkAssignResponse {
            assigned: 0,
            failed: 0,
            assignments: Vec::with_capacity(dates.len()),
            errors: Vec::new(),
        };

        for date in dates {
            match self
                .insert_workout_assignment(client.id, workout.workout.id, date, &request.notes, session.user_id)
                .await
            {
                Ok(assignment) => {
                    response.assigned += 1;
                    response.assignments.push(assignment);
                }
                Err(err) => {
                    tracing::warn!(client_id = %client.id, %date, error = %err, "workout assignment failed");
                    response.failed += 1;
                    response.errors.push(DateFailure {
                        date,
                        message: "Could not assign workout on this date".to_string(),
                    });
                }
            }
        }

        tracing::info!(
            client_id = %client.id,
            workout_id = %workout.workout.id,
            assigned = response.assigned,
            failed = response.failed,
            "workout assigned"
        );
        Ok(response)
    }

    async fn insert_workout_assignment(
        &self,
        client_id: Uuid,
        workout_id: Uuid,
        date: NaiveDate,
        notes: &Option<String>,
        assigned_by: Uuid,
    ) -> Result<ClientWorkout, sqlx::Error> {
        sqlx::query_as::<_, ClientWorkout>(&format!(
            "INSERT INTO client_workouts (client_id, workout_id, scheduled_date, notes, assigned_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            WORKOUT_ASSIGNMENT_COLUMNS
        ))
        .bind(client_id)
        .bind(workout_id)
        .bind(date)
        .bind(notes)
        .bind(assigned_by)
        .fetch_one(&self.db)
        .await
    }

    /// Starts a program for a client. The subscription is checked before
    /// anything is written; no transaction spans the check and the insert.
    pub async fn assign_program(
        &self,
        session: &UserSession,
        request: AssignProgramRequest,
    ) -> AppResult<ClientWorkoutProgram> {
        access::require_staff(session)?;

        let client = self.clients.authorized_client(session, request.client_id).await?;
        let program = self.programs.get_program(session, request.program_id).await?;
        access::ensure_can_receive_program(&client)?;

        let assignment = sqlx::query_as::<_, ClientWorkoutProgram>(&format!(
            "INSERT INTO client_workout_programs (client_id, program_id, start_date, notes, assigned_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            PROGRAM_ASSIGNMENT_COLUMNS
        ))
        .bind(client.id)
        .bind(program.program.id)
        .bind(request.start_date.date())
        .bind(&request.notes)
        .bind(session.user_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            client_id = %client.id,
            program_id = %program.program.id,
            start_date = %assignment.start_date,
            "program assigned"
        );
        Ok(assignment)
    }

    async fn find_workout_assignment(&self, assignment_id: Uuid) -> AppResult<ClientWorkout> {
        sqlx::query_as::<_, ClientWorkout>(&format!(
            "SELECT {} FROM client_workouts WHERE id = $1",
            WORKOUT_ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Assignment"))
    }

    async fn find_program_assignment(
        &self,
        assignment_id: Uuid,
    ) -> AppResult<ClientWorkoutProgram> {
        sqlx::query_as::<_, ClientWorkoutProgram>(&format!(
            "SELECT {} FROM client_workout_programs WHERE id = $1",
            PROGRAM_ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::not_found("Assignment"))
    }

    /// Out-of-scope assignments are reported exactly like missing ones
    async fn ensure_in_scope(&self, session: &UserSession, client_id: Uuid) -> AppResult<()> {
        let client = self.clients.get_client(client_id).await?;
        access::authorize_client(session, client)
            .map(|_| ())
            .map_err(|_| AppError::not_found("Assignment"))
    }

    pub async fn update_workout_assignment(
        &self,
        session: &UserSession,
        assignment_id: Uuid,
        request: UpdateWorkoutAssignmentRequest,
    ) -> AppResult<ClientWorkout> {
        let existing = self.find_workout_assignment(assignment_id).await?;
        self.ensure_in_scope(session, existing.client_id).await?;

        if session.role == UserRole::Client
            && (request.notes.is_some() || request.scheduled_date.is_some())
        {
            return Err(AppError::Forbidden("Clients may only update the status".to_string()));
        }

        let completed_at = completion_stamp(existing.completed_at, request.status);

        let assignment = sqlx::query_as::<_, ClientWorkout>(&format!(
            "UPDATE client_workouts SET
                status = COALESCE($2, status),
                notes = COALESCE($3, notes),
                scheduled_date = COALESCE($4, scheduled_date),
                completed_at = $5,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            WORKOUT_ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .bind(request.status)
        .bind(request.notes)
        .bind(request.scheduled_date.map(|d| d.date()))
        .bind(completed_at)
        .fetch_one(&self.db)
        .await?;

        Ok(assignment)
    }

    pub async fn update_program_assignment(
        &self,
        session: &UserSession,
        assignment_id: Uuid,
        request: UpdateProgramAssignmentRequest,
    ) -> AppResult<ClientWorkoutProgram> {
        let existing = self.find_program_assignment(assignment_id).await?;
        self.ensure_in_scope(session, existing.client_id).await?;

        if session.role == UserRole::Client
            && (request.notes.is_some() || request.start_date.is_some())
        {
            return Err(AppError::Forbidden("Clients may only update the status".to_string()));
        }

        let assignment = sqlx::query_as::<_, ClientWorkoutProgram>(&format!(
            "UPDATE client_workout_programs SET
                status = COALESCE($2, status),
                notes = COALESCE($3, notes),
                start_date = COALESCE($4, start_date),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PROGRAM_ASSIGNMENT_COLUMNS
        ))
        .bind(assignment_id)
        .bind(request.status)
        .bind(request.notes)
        .bind(request.start_date.map(|d| d.date()))
        .fetch_one(&self.db)
        .await?;

        Ok(assignment)
    }

    /// Deletes exactly one assignment row; the workout itself is untouched
    pub async fn delete_workout_assignment(
        &self,
        session: &UserSession,
        assignment_id: Uuid,
    ) -> AppResult<()> {
        access::require_staff(session)?;
        let existing = self.find_workout_assignment(assignment_id).await?;
        self.ensure_in_scope(session, existing.client_id).await?;

        sqlx::query("DELETE FROM client_workouts WHERE id = $1")
            .bind(assignment_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Deletes exactly one program assignment; the program itself is untouched
    pub async fn delete_program_assignment(
        &self,
        session: &UserSession,
        assignment_id: Uuid,
    ) -> AppResult<()> {
        access::require_staff(session)?;
        let existing = self.find_program_assignment(assignment_id).await?;
        self.ensure_in_scope(session, existing.client_id).await?;

        sqlx::query("DELETE FROM client_workout_programs WHERE id = $1")
            .bind(assignment_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_completion_stamp() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();

        assert_eq!(completion_stamp(None, None), None);
        assert_eq!(completion_stamp(Some(earlier), None), Some(earlier));
        assert!(completion_stamp(None, Some(AssignmentStatus::Completed)).is_some());
        // re-completing keeps the original stamp
        assert_eq!(
            completion_stamp(Some(earlier), Some(AssignmentStatus::Completed)),
            Some(earlier)
        );
        assert_eq!(completion_stamp(Some(earlier), Some(AssignmentStatus::Missed)), None);
    }
}
