use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use crate::models::CalendarDate;

/// Assignment lifecycle. Any status may be set from any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "assignment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Scheduled,
    InProgress,
    Completed,
    Missed,
    Cancelled,
}

/// A workout scheduled for a client on one date
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientWorkout {
    pub id: Uuid,
    pub client_id: Uuid,
    pub workout_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
    pub assigned_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientWorkoutView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: ClientWorkout,
    pub workout_name: String,
    pub client_name: String,
    pub trainer_id: Option<Uuid>,
}

/// A program started for a client; only the start date is stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientWorkoutProgram {
    pub id: Uuid,
    pub client_id: Uuid,
    pub program_id: Uuid,
    pub start_date: NaiveDate,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientProgramView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub assignment: ClientWorkoutProgram,
    pub program_name: String,
    pub total_days: i32,
    pub client_name: String,
    pub trainer_id: Option<Uuid>,
    /// Last occupied day, derived from the start date and program length
    #[sqlx(skip)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignWorkoutRequest {
    pub client_id: Uuid,
    pub workout_id: Uuid,
    pub scheduled_date: Option<CalendarDate>,
    /// Bulk form: one assignment per date, at most a year of them
    #[serde(default)]
    #[validate(length(max = 366))]
    pub scheduled_dates: Vec<CalendarDate>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

impl AssignWorkoutRequest {
    /// Every requested date, in request order, without repeats
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut seen = HashSet::with_capacity(self.scheduled_dates.len() + 1);
        self.scheduled_date
            .iter()
            .chain(self.scheduled_dates.iter())
            .map(CalendarDate::date)
            .filter(|date| seen.insert(*date))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct DateFailure {
    pub date: NaiveDate,
    pub message: String,
}

/// Outcome of a (possibly bulk) workout assignment
#[derive(Debug, Serialize)]
pub struct BulkAssignResponse {
    pub assigned: usize,
    pub failed: usize,
    pub assignments: Vec<ClientWorkout>,
    pub errors: Vec<DateFailure>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignProgramRequest {
    pub client_id: Uuid,
    pub program_id: Uuid,
    pub start_date: CalendarDate,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWorkoutAssignmentRequest {
    pub status: Option<AssignmentStatus>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub scheduled_date: Option<CalendarDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProgramAssignmentRequest {
    pub status: Option<AssignmentStatus>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub start_date: Option<CalendarDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentQuery {
    pub client_id: Option<Uuid>,
    pub status: Option<AssignmentStatus>,
    pub from: Option<CalendarDate>,
    pub to: Option<CalendarDate>,
}
