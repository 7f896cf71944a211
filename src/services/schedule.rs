//! Expansion of assignments into calendar day-cells.
//!
//! A program assignment only stores its start date. Every date it occupies
//! is derived here, and this is the only place that does so: the calendar,
//! assignment listings and the seeder all go through these functions.

use chrono::{Days, NaiveDate};

use crate::models::{
    CellSource, ClientWorkout, ClientWorkoutProgram, DayCell, ExerciseEntry, ProgramDetail,
    WorkoutDetail,
};

/// Seconds of work assumed per set when a duration has to be estimated
pub const SECONDS_PER_SET: i64 = 45;

/// Dates occupied by a program of `total_days` days starting on `start`.
///
/// Pure calendar-day arithmetic: month ends, leap days and DST changes
/// cannot shift or repeat a date.
pub fn program_dates(start: NaiveDate, total_days: u32) -> Vec<NaiveDate> {
    (0..u64::from(total_days))
        .map_while(|offset| start.checked_add_days(Days::new(offset)))
        .collect()
}

/// Last date occupied by a program, `None` for an empty program
pub fn program_end_date(start: NaiveDate, total_days: i32) -> Option<NaiveDate> {
    if total_days < 1 {
        return None;
    }
    start.checked_add_days(Days::new(total_days as u64 - 1))
}

/// Sum of sets × (work + rest), rounded up to whole minutes
pub fn estimate_duration_minutes(entries: &[ExerciseEntry]) -> Option<i32> {
    if entries.is_empty() {
        return None;
    }
    let seconds: i64 = entries
        .iter()
        .map(|entry| {
            let rest = i64::from(entry.rest_seconds.unwrap_or(0).max(0));
            i64::from(entry.sets.max(0)) * (SECONDS_PER_SET + rest)
        })
        .sum();
    Some(((seconds + 59) / 60) as i32)
}

/// One cell per program day, dated `start_date + (day_number - 1)`
pub fn expand_program_assignment(
    assignment: &ClientWorkoutProgram,
    program: &ProgramDetail,
) -> Vec<DayCell> {
    let total_days = program.program.total_days.max(0) as u32;

    program_dates(assignment.start_date, total_days)
        .into_iter()
        .enumerate()
        .map(|(offset, date)| {
            let day_number = offset as i32 + 1;
            let day = program.day(day_number);
            // a missing day record is a rest day too
            let is_rest_day = day.map_or(true, |d| d.is_rest());

            let exercises = match day {
                Some(d) if !is_rest_day => d.exercises.clone(),
                _ => Vec::new(),
            };
            let estimated_duration = if is_rest_day {
                None
            } else {
                day.and_then(|d| d.day.estimated_duration)
                    .or_else(|| estimate_duration_minutes(&exercises))
            };

            let label = match day.and_then(|d| d.day.name.as_deref()) {
                Some(name) => name.to_string(),
                None if is_rest_day => "Rest day".to_string(),
                None => format!("Day {}", day_number),
            };

            DayCell {
                id: format!("{}-day-{}", assignment.id, day_number),
                assignment_id: assignment.id,
                client_id: assignment.client_id,
                date,
                title: format!("{}: {}", program.program.name, label),
                source: CellSource::Program {
                    program_id: program.program.id,
                    day_number,
                },
                is_rest_day,
                exercises,
                estimated_duration,
                status: assignment.status,
                notes: day
                    .and_then(|d| d.day.notes.clone())
                    .or_else(|| assignment.notes.clone()),
            }
        })
        .collect()
}

pub fn workout_cell(assignment: &ClientWorkout, workout: &WorkoutDetail) -> DayCell {
    DayCell {
        id: assignment.id.to_string(),
        assignment_id: assignment.id,
        client_id: assignment.client_id,
        date: assignment.scheduled_date,
        title: workout.workout.name.clone(),
        source: CellSource::Workout {
            workout_id: workout.workout.id,
        },
        is_rest_day: false,
        exercises: workout.exercises.clone(),
        estimated_duration: workout
            .workout
            .estimated_duration
            .or_else(|| estimate_duration_minutes(&workout.exercises)),
        status: assignment.status,
        notes: assignment.notes.clone(),
    }
}

/// Keeps cells within `[from, to]`, ordered by date then id
pub fn cells_in_range(cells: Vec<DayCell>, from: NaiveDate, to: NaiveDate) -> Vec<DayCell> {
    let mut cells: Vec<DayCell> = cells
        .into_iter()
        .filter(|cell| cell.date >= from && cell.date <= to)
        .collect();
    cells.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentStatus, WorkoutDay, WorkoutDayDetail, WorkoutProgram, Workout};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(sets: i32, rest_seconds: Option<i32>) -> ExerciseEntry {
        ExerciseEntry {
            id: Uuid::new_v4(),
            exercise_id: Uuid::new_v4(),
            exercise_name: "Back Squat".to_string(),
            order_index: 0,
            sets,
            reps: Some("5".to_string()),
            rest_seconds,
            notes: None,
        }
    }

    fn program(total_days: i32, days: Vec<WorkoutDayDetail>) -> ProgramDetail {
        ProgramDetail {
            program: WorkoutProgram {
                id: Uuid::new_v4(),
                name: "Strength".to_string(),
                description: None,
                creator_id: Uuid::new_v4(),
                total_days,
                is_public: false,
                difficulty: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            days,
        }
    }

    fn day(
        program_id: Uuid,
        day_number: i32,
        is_rest_day: bool,
        exercises: Vec<ExerciseEntry>,
    ) -> WorkoutDayDetail {
        WorkoutDayDetail {
            day: WorkoutDay {
                id: Uuid::new_v4(),
                program_id,
                day_number,
                name: None,
                is_rest_day,
                estimated_duration: None,
                notes: None,
            },
            exercises,
        }
    }

    fn assignment(start_date: NaiveDate) -> ClientWorkoutProgram {
        ClientWorkoutProgram {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            start_date,
            status: AssignmentStatus::Scheduled,
            notes: None,
            assigned_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_program_dates_cross_month_end() {
        assert_eq!(
            program_dates(date(2024, 1, 30), 4),
            vec![date(2024, 1, 30), date(2024, 1, 31), date(2024, 2, 1), date(2024, 2, 2)]
        );
    }

    #[test]
    fn test_program_dates_cross_leap_day_and_year() {
        assert_eq!(
            program_dates(date(2024, 2, 28), 3),
            vec![date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]
        );
        assert_eq!(
            program_dates(date(2023, 12, 31), 2),
            vec![date(2023, 12, 31), date(2024, 1, 1)]
        );
        assert!(program_dates(date(2024, 1, 1), 0).is_empty());
    }

    #[test]
    fn test_program_end_date() {
        assert_eq!(program_end_date(date(2024, 1, 30), 4), Some(date(2024, 2, 2)));
        assert_eq!(program_end_date(date(2024, 1, 30), 1), Some(date(2024, 1, 30)));
        assert_eq!(program_end_date(date(2024, 1, 30), 0), None);
    }

    #[test]
    fn test_estimate_duration_rounds_up() {
        // 3 × (45 + 60) + 2 × 45 = 405s
        let entries = vec![entry(3, Some(60)), entry(2, None)];
        assert_eq!(estimate_duration_minutes(&entries), Some(7));
        assert_eq!(estimate_duration_minutes(&[]), None);
    }

    #[test]
    fn test_expand_program_marks_rest_days() {
        let mut detail = program(4, vec![]);
        let program_id = detail.program.id;
        detail.days = vec![
            day(program_id, 1, false, vec![entry(3, Some(60))]),
            day(program_id, 2, true, vec![]),
            // day 3 has no record at all
            day(program_id, 4, false, vec![]),
        ];
        let assignment = assignment(date(2024, 1, 30));

        let cells = expand_program_assignment(&assignment, &detail);

        assert_eq!(cells.len(), 4);
        let rest: Vec<bool> = cells.iter().map(|c| c.is_rest_day).collect();
        assert_eq!(rest, vec![false, true, true, true]);
        assert_eq!(cells[0].estimated_duration, Some(6));
        assert_eq!(cells[0].title, "Strength: Day 1");
        assert_eq!(cells[1].title, "Strength: Rest day");
        assert!(cells[2].exercises.is_empty());
        assert_eq!(cells[2].estimated_duration, None);
        assert_eq!(cells[3].date, date(2024, 2, 2));
        assert_eq!(cells[3].id, format!("{}-day-4", assignment.id));
        assert_eq!(
            cells[3].source,
            CellSource::Program { program_id, day_number: 4 }
        );
    }

    #[test]
    fn test_stored_duration_wins_over_estimate() {
        let mut detail = program(1, vec![]);
        let mut first = day(detail.program.id, 1, false, vec![entry(3, Some(60))]);
        first.day.estimated_duration = Some(50);
        first.day.name = Some("Lower body".to_string());
        detail.days = vec![first];

        let cells = expand_program_assignment(&assignment(date(2024, 5, 1)), &detail);

        assert_eq!(cells[0].estimated_duration, Some(50));
        assert_eq!(cells[0].title, "Strength: Lower body");
    }

    #[test]
    fn test_workout_cell_uses_assignment_id() {
        let workout = WorkoutDetail {
            workout: Workout {
                id: Uuid::new_v4(),
                name: "Upper Body Blast".to_string(),
                description: None,
                creator_id: Uuid::new_v4(),
                is_public: true,
                difficulty: None,
                estimated_duration: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            exercises: vec![entry(4, Some(90))],
        };
        let assignment = ClientWorkout {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            workout_id: workout.workout.id,
            scheduled_date: date(2024, 3, 10),
            status: AssignmentStatus::Completed,
            notes: Some("felt strong".to_string()),
            assigned_by: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let cell = workout_cell(&assignment, &workout);

        assert_eq!(cell.id, assignment.id.to_string());
        assert_eq!(cell.date, date(2024, 3, 10));
        assert_eq!(cell.estimated_duration, Some(9));
        assert_eq!(cell.status, AssignmentStatus::Completed);
    }

    #[test]
    fn test_cells_in_range_filters_and_orders() {
        let detail = program(10, vec![]);
        let first = assignment(date(2024, 1, 1));
        let second = assignment(date(2024, 1, 3));
        let mut cells = expand_program_assignment(&first, &detail);
        cells.extend(expand_program_assignment(&second, &detail));

        let visible = cells_in_range(cells, date(2024, 1, 5), date(2024, 1, 6));

        assert_eq!(visible.len(), 4);
        assert!(visible.windows(2).all(|w| w[0].date <= w[1].date));
        assert_eq!(visible[0].date, date(2024, 1, 5));
        assert_eq!(visible[3].date, date(2024, 1, 6));
    }
}
