use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Difficulty, ExerciseEntry, ExerciseEntryInput};

/// Named multi-day template; days are numbered from 1 to `total_days`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutProgram {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub creator_id: Uuid,
    pub total_days: i32,
    pub is_public: bool,
    pub difficulty: Option<Difficulty>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkoutDay {
    pub id: Uuid,
    pub program_id: Uuid,
    pub day_number: i32,
    pub name: Option<String>,
    pub is_rest_day: bool,
    pub estimated_duration: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDayDetail {
    #[serde(flatten)]
    pub day: WorkoutDay,
    pub exercises: Vec<ExerciseEntry>,
}

impl WorkoutDayDetail {
    pub fn is_rest(&self) -> bool {
        self.day.is_rest_day || self.exercises.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramDetail {
    #[serde(flatten)]
    pub program: WorkoutProgram,
    pub days: Vec<WorkoutDayDetail>,
}

impl ProgramDetail {
    pub fn day(&self, day_number: i32) -> Option<&WorkoutDayDetail> {
        self.days.iter().find(|d| d.day.day_number == day_number)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WorkoutDayInput {
    #[validate(range(min = 1, max = 366))]
    pub day_number: i32,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub is_rest_day: bool,
    #[validate(range(min = 1, max = 600))]
    pub estimated_duration: Option<i32>,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub exercises: Vec<ExerciseEntryInput>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProgramRequest {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 366, message = "Programs span between 1 and 366 days"))]
    pub total_days: i32,
    #[serde(default)]
    pub is_public: bool,
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    #[validate(nested)]
    pub days: Vec<WorkoutDayInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProgramRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1, max = 366))]
    pub total_days: Option<i32>,
    pub is_public: Option<bool>,
    pub difficulty: Option<Difficulty>,
}

/// Body of `PUT /programs/{id}/days/{day_number}`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertDayRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub is_rest_day: bool,
    #[validate(range(min = 1, max = 600))]
    pub estimated_duration: Option<i32>,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub exercises: Vec<ExerciseEntryInput>,
}

impl UpsertDayRequest {
    pub fn into_day_input(self, day_number: i32) -> WorkoutDayInput {
        WorkoutDayInput {
            day_number,
            name: self.name,
            is_rest_day: self.is_rest_day,
            estimated_duration: self.estimated_duration,
            notes: self.notes,
            exercises: self.exercises,
        }
    }
}

/// Checks that every day number fits the program and appears once
pub fn check_program_days(total_days: i32, days: &[WorkoutDayInput]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for day in days {
        if day.day_number < 1 || day.day_number > total_days {
            return Err(format!(
                "Day {} is outside the program's {} days",
                day.day_number, total_days
            ));
        }
        if !seen.insert(day.day_number) {
            return Err(format!("Day {} appears more than once", day.day_number));
        }
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgramQuery {
    pub search: Option<String>,
    pub mine: Option<bool>,
}
