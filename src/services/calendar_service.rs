use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{UserRole, UserSession};
use crate::error::{AppError, AppResult};
use crate::models::{
    AssignmentQuery, CalendarDate, CalendarQuery, CalendarResponse, DayCell, ProgramDetail,
    WorkoutDetail,
};
use crate::services::{schedule, AssignmentService, ClientService, ProgramService, WorkoutService};

/// Longest window a single calendar request may cover
pub const MAX_CALENDAR_DAYS: i64 = 366;

pub fn check_window(from: NaiveDate, to: NaiveDate) -> AppResult<()> {
    if to < from {
        return Err(AppError::Validation("`to` must not be before `from`".to_string()));
    }
    if (to - from).num_days() >= MAX_CALENDAR_DAYS {
        return Err(AppError::Validation(format!(
            "Calendar window is limited to {} days",
            MAX_CALENDAR_DAYS
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CalendarService {
    assignments: AssignmentService,
    clients: ClientService,
    workouts: WorkoutService,
    programs: ProgramService,
}

impl CalendarService {
    pub fn new(db: PgPool) -> Self {
        Self {
            assignments: AssignmentService::new(db.clone()),
            clients: ClientService::new(db.clone()),
            workouts: WorkoutService::new(db.clone()),
            programs: ProgramService::new(db),
        }
    }

    /// Day-cells of every assignment in scope overlapping `[from, to]`.
    /// Clients always get their own calendar; staff may narrow to one client.
    pub async fn calendar(
        &self,
        session: &UserSession,
        query: CalendarQuery,
    ) -> AppResult<CalendarResponse> {
        let from = query.from.date();
        let to = query.to.date();
        check_window(from, to)?;

        let client_id = match (session.role, query.client_id) {
            (UserRole::Client, None) => Some(self.clients.own_client(session).await?.id),
            (_, client_id) => client_id,
        };

        let filter = AssignmentQuery {
            client_id,
            status: None,
            from: Some(CalendarDate(from)),
            to: Some(CalendarDate(to)),
        };

        let workout_assignments = self.assignments.list_workout_assignments(session, &filter).await?;
        let program_assignments = self.assignments.list_program_assignments(session, &filter).await?;

        let mut workouts: HashMap<Uuid, WorkoutDetail> = HashMap::new();
        let mut programs: HashMap<Uuid, ProgramDetail> = HashMap::new();
        let mut cells: Vec<DayCell> = Vec::new();

        for view in &workout_assignments {
            let workout_id = view.assignment.workout_id;
            if !workouts.contains_key(&workout_id) {
                workouts.insert(workout_id, self.workouts.fetch_detail(workout_id).await?);
            }
            if let Some(workout) = workouts.get(&workout_id) {
                cells.push(schedule::workout_cell(&view.assignment, workout));
            }
        }

        for view in &program_assignments {
            let program_id = view.assignment.program_id;
            if !programs.contains_key(&program_id) {
                programs.insert(program_id, self.programs.fetch_detail(program_id).await?);
            }
            if let Some(program) = programs.get(&program_id) {
                cells.extend(schedule::expand_program_assignment(&view.assignment, program));
            }
        }

        tracing::debug!(
            %from,
            %to,
            workouts = workout_assignments.len(),
            programs = program_assignments.len(),
            "calendar expanded"
        );

        Ok(CalendarResponse {
            from,
            to,
            days: schedule::cells_in_range(cells, from, to),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_check_window() {
        assert!(check_window(date(2024, 1, 1), date(2024, 1, 1)).is_ok());
        assert!(check_window(date(2024, 1, 1), date(2024, 12, 31)).is_ok());
        assert_matches!(check_window(date(2024, 1, 2), date(2024, 1, 1)), Err(AppError::Validation(_)));
        assert_matches!(check_window(date(2024, 1, 1), date(2025, 1, 1)), Err(AppError::Validation(_)));
    }
}
