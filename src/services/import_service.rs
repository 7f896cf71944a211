//! CSV import of exercises and workouts.
//!
//! Rows are parsed up front; every valid row then goes through the same
//! service calls the JSON endpoints use. A bad row is reported with its
//! 1-based row number and never aborts the rest of the file.

use csv::{ReaderBuilder, Trim};
use uuid::Uuid;
use validator::Validate;

use crate::auth::UserSession;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateExerciseRequest, CreateWorkoutRequest, Difficulty, ExerciseCsvRow, ExerciseEntryInput,
    ImportReport, RowError, WorkoutCsvRow,
};
use crate::services::{ExerciseService, WorkoutService};

const DEFAULT_SETS: i32 = 3;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `a; b;;c` → `["a", "b", "c"]`
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn reader(data: &[u8]) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(data)
}

fn exercise_request(row: ExerciseCsvRow) -> Result<CreateExerciseRequest, String> {
    let difficulty = match non_empty(row.difficulty) {
        None => Difficulty::default(),
        Some(value) => {
            Difficulty::parse(&value).ok_or_else(|| format!("Unknown difficulty '{}'", value))?
        }
    };

    let request = CreateExerciseRequest {
        name: row.name.trim().to_string(),
        description: non_empty(row.description),
        category: row.category.trim().to_string(),
        difficulty,
        muscle_groups: split_list(row.muscle_groups.as_deref()),
        equipment: split_list(row.equipment.as_deref()),
        instructions: non_empty(row.instructions),
        video_url: non_empty(row.video_url),
    };
    request.validate().map_err(|err| err.to_string())?;

    Ok(request)
}

/// Parsed exercise rows keyed by their 1-based row number
pub fn parse_exercise_csv(data: &[u8]) -> Vec<(usize, Result<CreateExerciseRequest, String>)> {
    reader(data)
        .deserialize::<ExerciseCsvRow>()
        .enumerate()
        .map(|(index, record)| {
            let parsed = record
                .map_err(|err| format!("Malformed row: {}", err))
                .and_then(exercise_request);
            (index + 1, parsed)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub row: usize,
    pub exercise_name: String,
    pub sets: i32,
    pub reps: Option<String>,
    pub rest_seconds: Option<i32>,
    pub notes: Option<String>,
}

/// Rows of one workout, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDraft {
    pub row: usize,
    pub name: String,
    pub description: Option<String>,
    pub lines: Vec<DraftLine>,
}

/// Groups workout rows by name in order of first appearance
pub fn parse_workout_csv(data: &[u8]) -> (Vec<WorkoutDraft>, Vec<RowError>) {
    let mut drafts: Vec<WorkoutDraft> = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in reader(data).deserialize::<WorkoutCsvRow>().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                errors.push(RowError {
                    row,
                    message: format!("Malformed row: {}", err),
                });
                continue;
            }
        };

        let name = record.workout_name.trim().to_string();
        let exercise_name = record.exercise_name.trim().to_string();
        if name.is_empty() || exercise_name.is_empty() {
            errors.push(RowError {
                row,
                message: "workout_name and exercise_name are required".to_string(),
            });
            continue;
        }

        let line = DraftLine {
            row,
            exercise_name,
            sets: record.sets.unwrap_or(DEFAULT_SETS),
            reps: non_empty(record.reps),
            rest_seconds: record.rest_seconds,
            notes: non_empty(record.notes),
        };

        match drafts.iter_mut().find(|draft| draft.name == name) {
            Some(draft) => {
                if draft.description.is_none() {
                    draft.description = non_empty(record.workout_description);
                }
                draft.lines.push(line);
            }
            None => drafts.push(WorkoutDraft {
                row,
                name,
                description: non_empty(record.workout_description),
                lines: vec![line],
            }),
        }
    }

    (drafts, errors)
}

#[derive(Debug, Clone)]
pub struct ImportService {
    exercises: ExerciseService,
    workouts: WorkoutService,
}

impl ImportService {
    pub fn new(exercises: ExerciseService, workouts: WorkoutService) -> Self {
        Self { exercises, workouts }
    }

    pub async fn import_exercises(
        &self,
        session: &UserSession,
        data: &[u8],
    ) -> AppResult<ImportReport> {
        let rows = parse_exercise_csv(data);
        if rows.is_empty() {
            return Err(AppError::Validation("CSV contains no data rows".to_string()));
        }

        let mut report = ImportReport::default();
        for (row, parsed) in rows {
            let request = match parsed {
                Ok(request) => request,
                Err(message) => {
                    report.record_failure(row, message);
                    continue;
                }
            };

            match self.exercises.create_exercise(Some(session.user_id), request).await {
                Ok(_) => report.created += 1,
                Err(err) => {
                    tracing::warn!(row, error = %err, "exercise import row failed");
                    report.record_failure(row, "Could not save exercise");
                }
            }
        }

        tracing::info!(created = report.created, failed = report.failed, "exercises imported");
        Ok(report)
    }

    pub async fn import_workouts(
        &self,
        session: &UserSession,
        data: &[u8],
    ) -> AppResult<ImportReport> {
        let (drafts, row_errors) = parse_workout_csv(data);
        if drafts.is_empty() && row_errors.is_empty() {
            return Err(AppError::Validation("CSV contains no data rows".to_string()));
        }

        let mut report = ImportReport::default();
        for error in row_errors {
            report.record_failure(error.row, error.message);
        }

        for draft in drafts {
            let request = match self.resolve_draft(&draft).await? {
                Ok(request) => request,
                Err(message) => {
                    report.record_failure(draft.row, message);
                    continue;
                }
            };

            match self.workouts.create_workout(session.user_id, request).await {
                Ok(_) => report.created += 1,
                Err(err) => {
                    tracing::warn!(row = draft.row, error = %err, "workout import failed");
                    report.record_failure(draft.row, format!("Could not save workout '{}'", draft.name));
                }
            }
        }

        tracing::info!(created = report.created, failed = report.failed, "workouts imported");
        Ok(report)
    }

    /// Resolves exercise names; the inner error describes why the draft is unusable
    async fn resolve_draft(
        &self,
        draft: &WorkoutDraft,
    ) -> AppResult<Result<CreateWorkoutRequest, String>> {
        let mut entries = Vec::with_capacity(draft.lines.len());

        for line in &draft.lines {
            let exercise_id: Uuid = match self.exercises.find_by_name(&line.exercise_name).await? {
                Some(exercise) => exercise.id,
                None => {
                    return Ok(Err(format!(
                        "Unknown exercise '{}' (row {})",
                        line.exercise_name, line.row
                    )))
                }
            };

            entries.push(ExerciseEntryInput {
                exercise_id,
                sets: line.sets,
                reps: line.reps.clone(),
                rest_seconds: line.rest_seconds,
                notes: line.notes.clone(),
            });
        }

        let request = CreateWorkoutRequest {
            name: draft.name.clone(),
            description: draft.description.clone(),
            is_public: false,
            difficulty: None,
            estimated_duration: None,
            exercises: entries,
        };

        Ok(request.validate().map(|_| request).map_err(|err| err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("chest; triceps;;shoulders ")), vec!["chest", "triceps", "shoulders"]);
        assert!(split_list(None).is_empty());
        assert!(split_list(Some("  ")).is_empty());
    }

    #[test]
    fn test_parse_exercise_csv_reports_bad_rows() {
        let csv = "name,category,difficulty,muscle_groups,equipment,instructions,video_url,description\n\
                   Push-up,strength,beginner,chest;triceps,,Keep a straight line,,Classic\n\
                   Snatch,olympic,legendary,,barbell,,,\n\
                   ,cardio,,,,,,\n\
                   Plank,core,,core,,,,\n";

        let rows = parse_exercise_csv(csv.as_bytes());

        assert_eq!(rows.len(), 4);
        let push_up = rows[0].1.as_ref().unwrap();
        assert_eq!(push_up.name, "Push-up");
        assert_eq!(push_up.muscle_groups, vec!["chest", "triceps"]);
        assert!(push_up.equipment.is_empty());
        assert_eq!(push_up.description.as_deref(), Some("Classic"));

        assert_eq!(rows[1].0, 2);
        assert!(rows[1].1.as_ref().unwrap_err().contains("legendary"));
        assert!(rows[2].1.is_err());

        let plank = rows[3].1.as_ref().unwrap();
        assert_eq!(plank.difficulty, Difficulty::Beginner);
    }

    #[test]
    fn test_parse_workout_csv_groups_by_name() {
        let csv = "workout_name,workout_description,exercise_name,sets,reps,rest_seconds,notes\n\
                   Upper A,Push focus,Bench Press,4,6-8,120,\n\
                   Upper A,,Push-up,3,AMRAP,60,to failure\n\
                   Lower A,Legs,Back Squat,5,5,180,\n\
                   Upper A,,Dumbbell Row,,10,,\n\
                   Broken,,,3,10,60,\n";

        let (drafts, errors) = parse_workout_csv(csv.as_bytes());

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].name, "Upper A");
        assert_eq!(drafts[0].description.as_deref(), Some("Push focus"));
        let names: Vec<&str> = drafts[0].lines.iter().map(|l| l.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["Bench Press", "Push-up", "Dumbbell Row"]);
        assert_eq!(drafts[0].lines[2].sets, DEFAULT_SETS);
        assert_eq!(drafts[0].lines[1].notes.as_deref(), Some("to failure"));
        assert_eq!(drafts[1].row, 3);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 5);
    }

    #[test]
    fn test_parse_workout_csv_bad_number() {
        let csv = "workout_name,workout_description,exercise_name,sets,reps,rest_seconds,notes\n\
                   Upper A,,Bench Press,four,6,120,\n";

        let (drafts, errors) = parse_workout_csv(csv.as_bytes());

        assert!(drafts.is_empty());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Malformed row"));
    }
}
