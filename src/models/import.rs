use serde::{Deserialize, Serialize};

/// Row of an exercise CSV. List columns are `;`-separated.
#[derive(Debug, Deserialize)]
pub struct ExerciseCsvRow {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub muscle_groups: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Row of a workout CSV; consecutive rows sharing `workout_name` form one workout
#[derive(Debug, Deserialize)]
pub struct WorkoutCsvRow {
    pub workout_name: String,
    #[serde(default)]
    pub workout_description: Option<String>,
    pub exercise_name: String,
    #[serde(default)]
    pub sets: Option<i32>,
    #[serde(default)]
    pub reps: Option<String>,
    #[serde(default)]
    pub rest_seconds: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based data row, header excluded
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    pub fn record_failure(&mut self, row: usize, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(RowError {
            row,
            message: message.into(),
        });
    }
}
