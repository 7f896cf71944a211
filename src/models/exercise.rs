use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type, Default)]
#[sqlx(type_name = "difficulty_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Difficulty::Beginner),
            "intermediate" => Some(Difficulty::Intermediate),
            "advanced" => Some(Difficulty::Advanced),
            _ => None,
        }
    }
}

/// Catalog entry referenced by workout and program entries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub difficulty: Difficulty,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub instructions: Option<String>,
    pub video_url: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExerciseRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    pub instructions: Option<String>,
    #[validate(url(message = "Video URL must be a valid URL"))]
    pub video_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateExerciseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub muscle_groups: Option<Vec<String>>,
    pub equipment: Option<Vec<String>>,
    pub instructions: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExerciseQuery {
    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub muscle_group: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
