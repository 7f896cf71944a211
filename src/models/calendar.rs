use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AssignmentStatus, CalendarDate, ExerciseEntry};

/// Where a day-cell came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellSource {
    Workout { workout_id: Uuid },
    Program { program_id: Uuid, day_number: i32 },
}

/// One calendar day of an assignment. Derived on read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    /// `{assignment_id}` for workouts, `{assignment_id}-day-{n}` for program days
    pub id: String,
    pub assignment_id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    pub title: String,
    pub source: CellSource,
    pub is_rest_day: bool,
    pub exercises: Vec<ExerciseEntry>,
    pub estimated_duration: Option<i32>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub client_id: Option<Uuid>,
    pub from: CalendarDate,
    pub to: CalendarDate,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days: Vec<DayCell>,
}
