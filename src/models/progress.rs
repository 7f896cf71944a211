use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::CalendarDate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgressEntry {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_workout_id: Option<Uuid>,
    pub exercise_id: Option<Uuid>,
    pub date: NaiveDate,
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub duration_seconds: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProgressRequest {
    /// Required for staff; clients always log against their own profile
    pub client_id: Option<Uuid>,
    pub client_workout_id: Option<Uuid>,
    pub exercise_id: Option<Uuid>,
    pub date: CalendarDate,
    #[validate(range(min = 0, max = 100))]
    pub sets: Option<i32>,
    #[validate(range(min = 0, max = 1000))]
    pub reps: Option<i32>,
    #[validate(range(min = 0.0, max = 2000.0))]
    pub weight: Option<f64>,
    #[validate(range(min = 0, max = 86400))]
    pub duration_seconds: Option<i32>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgressQuery {
    pub client_id: Option<Uuid>,
    pub exercise_id: Option<Uuid>,
    pub from: Option<CalendarDate>,
    pub to: Option<CalendarDate>,
}
