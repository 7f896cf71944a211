use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::Difficulty;

/// Named single-day collection of ordered exercise entries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub is_public: bool,
    pub difficulty: Option<Difficulty>,
    pub estimated_duration: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ordered exercise line of a workout or a program day, joined with the exercise name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExerciseEntry {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub exercise_name: String,
    pub order_index: i32,
    pub sets: i32,
    pub reps: Option<String>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub workout: Workout,
    pub exercises: Vec<ExerciseEntry>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExerciseEntryInput {
    pub exercise_id: Uuid,
    #[validate(range(min = 1, max = 100, message = "Sets must be between 1 and 100"))]
    #[serde(default = "default_sets")]
    pub sets: i32,
    #[validate(length(max = 50))]
    pub reps: Option<String>,
    #[validate(range(min = 0, max = 3600, message = "Rest must be between 0 and 3600 seconds"))]
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

fn default_sets() -> i32 {
    3
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateWorkoutRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 1, max = 600))]
    pub estimated_duration: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub exercises: Vec<ExerciseEntryInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWorkoutRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 1, max = 600))]
    pub estimated_duration: Option<i32>,
    /// Replaces every entry when present
    #[validate(nested)]
    pub exercises: Option<Vec<ExerciseEntryInput>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkoutQuery {
    pub search: Option<String>,
    /// Restrict to workouts the requester created
    pub mine: Option<bool>,
}
