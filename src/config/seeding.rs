use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{UserRole, UserSession};
use crate::models::*;
use crate::services::*;

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "CoachDesk#2024";

pub const DEMO_PROGRAM_NAME: &str = "4-Week Strength Builder";

struct CatalogEntry {
    name: &'static str,
    category: &'static str,
    difficulty: Difficulty,
    muscle_groups: &'static [&'static str],
    equipment: &'static [&'static str],
    instructions: &'static str,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "Back Squat",
        category: "strength",
        difficulty: Difficulty::Intermediate,
        muscle_groups: &["quadriceps", "glutes", "hamstrings"],
        equipment: &["barbell", "squat rack"],
        instructions: "Brace, sit between the hips, drive up through the midfoot.",
    },
    CatalogEntry {
        name: "Goblet Squat",
        category: "strength",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["quadriceps", "glutes"],
        equipment: &["dumbbell"],
        instructions: "Hold the bell at the chest and squat with an upright torso.",
    },
    CatalogEntry {
        name: "Romanian Deadlift",
        category: "strength",
        difficulty: Difficulty::Intermediate,
        muscle_groups: &["hamstrings", "glutes", "lower back"],
        equipment: &["barbell"],
        instructions: "Hinge at the hips with soft knees until the hamstrings stretch.",
    },
    CatalogEntry {
        name: "Deadlift",
        category: "strength",
        difficulty: Difficulty::Advanced,
        muscle_groups: &["hamstrings", "glutes", "back"],
        equipment: &["barbell"],
        instructions: "Push the floor away, keep the bar close, lock out with the glutes.",
    },
    CatalogEntry {
        name: "Walking Lunge",
        category: "strength",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["quadriceps", "glutes"],
        equipment: &["dumbbell"],
        instructions: "Long stride, back knee towards the floor, alternate legs.",
    },
    CatalogEntry {
        name: "Bench Press",
        category: "strength",
        difficulty: Difficulty::Intermediate,
        muscle_groups: &["chest", "triceps", "shoulders"],
        equipment: &["barbell", "bench"],
        instructions: "Shoulder blades pinned, lower to the sternum, press to lockout.",
    },
    CatalogEntry {
        name: "Overhead Press",
        category: "strength",
        difficulty: Difficulty::Intermediate,
        muscle_groups: &["shoulders", "triceps"],
        equipment: &["barbell"],
        instructions: "Squeeze the glutes and press the bar in a straight line overhead.",
    },
    CatalogEntry {
        name: "Push-up",
        category: "strength",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["chest", "triceps", "core"],
        equipment: &[],
        instructions: "Body in one line, lower the chest to the floor, press back up.",
    },
    CatalogEntry {
        name: "Pull-up",
        category: "strength",
        difficulty: Difficulty::Advanced,
        muscle_groups: &["lats", "biceps"],
        equipment: &["pull-up bar"],
        instructions: "Start from a dead hang and pull the chin over the bar.",
    },
    CatalogEntry {
        name: "Bent-over Row",
        category: "strength",
        difficulty: Difficulty::Intermediate,
        muscle_groups: &["back", "biceps"],
        equipment: &["barbell"],
        instructions: "Hinge forward and row the bar to the lower ribs.",
    },
    CatalogEntry {
        name: "Dumbbell Row",
        category: "strength",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["back", "biceps"],
        equipment: &["dumbbell", "bench"],
        instructions: "One hand on the bench, row the dumbbell to the hip.",
    },
    CatalogEntry {
        name: "Plank",
        category: "core",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["core"],
        equipment: &[],
        instructions: "Forearms under shoulders, hold a straight line from head to heels.",
    },
    CatalogEntry {
        name: "Dead Bug",
        category: "core",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["core"],
        equipment: &[],
        instructions: "Lower opposite arm and leg while keeping the lower back flat.",
    },
    CatalogEntry {
        name: "Kettlebell Swing",
        category: "conditioning",
        difficulty: Difficulty::Intermediate,
        muscle_groups: &["glutes", "hamstrings", "core"],
        equipment: &["kettlebell"],
        instructions: "Snap the hips to float the bell to chest height.",
    },
    CatalogEntry {
        name: "Rowing Machine",
        category: "cardio",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["back", "legs"],
        equipment: &["rower"],
        instructions: "Legs, body, arms on the drive; reverse on the recovery.",
    },
    CatalogEntry {
        name: "Jump Rope",
        category: "cardio",
        difficulty: Difficulty::Beginner,
        muscle_groups: &["calves"],
        equipment: &["jump rope"],
        instructions: "Stay on the balls of the feet and turn the rope from the wrists.",
    },
];

/// (exercise name, sets, reps, rest seconds)
type Prescription = (&'static str, i32, &'static str, i32);

/// Weekly template of the demo program; `None` is a rest day
fn strength_week() -> [(Option<&'static str>, &'static [Prescription]); 7] {
    [
        (
            Some("Lower Strength"),
            &[
                ("Back Squat", 4, "6", 150),
                ("Romanian Deadlift", 3, "8", 120),
                ("Walking Lunge", 3, "10", 60),
            ],
        ),
        (
            Some("Upper Push"),
            &[
                ("Bench Press", 4, "6", 150),
                ("Overhead Press", 3, "8", 120),
                ("Push-up", 3, "AMRAP", 60),
            ],
        ),
        (None, &[]),
        (
            Some("Upper Pull"),
            &[
                ("Pull-up", 4, "5", 120),
                ("Bent-over Row", 3, "8", 90),
                ("Dead Bug", 3, "10", 45),
            ],
        ),
        (
            Some("Full Body"),
            &[
                ("Deadlift", 3, "5", 180),
                ("Goblet Squat", 3, "10", 90),
                ("Plank", 3, "45s", 45),
            ],
        ),
        (
            Some("Conditioning"),
            &[
                ("Kettlebell Swing", 5, "15", 60),
                ("Rowing Machine", 4, "500m", 90),
            ],
        ),
        (None, &[]),
    ]
}

/// First Monday on or after `date`
pub fn next_monday(date: NaiveDate) -> NaiveDate {
    let offset = (7 - date.weekday().num_days_from_monday()) % 7;
    date + Days::new(u64::from(offset))
}

fn seed_session(user: &User) -> UserSession {
    UserSession {
        user_id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        jti: String::new(),
        expires_at: 0,
    }
}

pub struct DatabaseSeeder {
    pool: PgPool,
}

impl DatabaseSeeder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Removes every row from every table, schema stays
    pub async fn wipe(&self) -> Result<()> {
        sqlx::query(
            "TRUNCATE progress_entries, client_workout_programs, client_workouts,
                      workout_day_exercises, workout_days, workout_programs,
                      workout_exercises, workouts, exercises, clients,
                      token_blacklist, users
             CASCADE",
        )
        .execute(&self.pool)
        .await
        .context("failed to wipe database")?;

        tracing::info!("Database wiped");
        Ok(())
    }

    /// Inserts the exercise catalog; exercises already present by name are kept
    pub async fn seed_catalog(&self) -> Result<usize> {
        let exercises = ExerciseService::new(self.pool.clone());
        let mut created = 0;

        for entry in CATALOG {
            if exercises.find_by_name(entry.name).await?.is_some() {
                continue;
            }

            exercises
                .create_exercise(
                    None,
                    CreateExerciseRequest {
                        name: entry.name.to_string(),
                        description: None,
                        category: entry.category.to_string(),
                        difficulty: entry.difficulty,
                        muscle_groups: entry.muscle_groups.iter().map(|s| s.to_string()).collect(),
                        equipment: entry.equipment.iter().map(|s| s.to_string()).collect(),
                        instructions: Some(entry.instructions.to_string()),
                        video_url: None,
                    },
                )
                .await?;
            created += 1;
        }

        tracing::info!(created, total = CATALOG.len(), "Exercise catalog seeded");
        Ok(created)
    }

    /// Wipes, then loads the catalog plus demo users, workouts, the demo
    /// program and a set of assignments anchored on `today`
    pub async fn seed_demo(&self, today: NaiveDate) -> Result<()> {
        tracing::info!("Starting demo seeding...");

        self.wipe().await?;
        self.seed_catalog().await?;

        let users = UserService::new(self.pool.clone());
        let clients = ClientService::new(self.pool.clone());
        let assignments = AssignmentService::new(self.pool.clone());

        let create = |email: &str, name: &str, role: UserRole| CreateUser {
            email: email.to_string(),
            name: name.to_string(),
            password: DEMO_PASSWORD.to_string(),
            role,
        };

        let _admin = users
            .create_user(create("admin@coachdesk.dev", "Ada Admin", UserRole::Admin))
            .await?;
        let head_coach = users
            .create_user(create("taylor@coachdesk.dev", "Taylor Trainer", UserRole::Trainer))
            .await?;
        let assistant = users
            .create_user(create("morgan@coachdesk.dev", "Morgan Trainer", UserRole::Trainer))
            .await?;

        let mut demo_clients = Vec::new();
        for (email, name, trainer, active) in [
            ("casey@coachdesk.dev", "Casey Client", Some(head_coach.id), true),
            ("jordan@coachdesk.dev", "Jordan Client", Some(head_coach.id), true),
            ("riley@coachdesk.dev", "Riley Client", Some(assistant.id), true),
            ("sam@coachdesk.dev", "Sam Client", None, false),
        ] {
            let user = users.create_user(create(email, name, UserRole::Client)).await?;
            let client = clients
                .get_by_user(user.id)
                .await?
                .context("client profile missing after registration")?;

            if let Some(trainer_id) = trainer {
                clients.assign_trainer(client.id, AssignTrainerRequest { trainer_id }).await?;
            }
            if active {
                clients
                    .update_subscription(
                        client.id,
                        UpdateSubscriptionRequest {
                            status: SubscriptionStatus::Active,
                            plan: Some("monthly".to_string()),
                            start_date: Some(today),
                            end_date: None,
                        },
                    )
                    .await?;
            }
            demo_clients.push(client.id);
        }

        let workouts = self.seed_workouts(head_coach.id).await?;
        let program_id = self.seed_program(head_coach.id).await?;

        let coach = seed_session(&head_coach);
        let start = next_monday(today);

        assignments
            .assign_program(
                &coach,
                AssignProgramRequest {
                    client_id: demo_clients[0],
                    program_id,
                    start_date: CalendarDate(start),
                    notes: Some("First training block".to_string()),
                },
            )
            .await?;

        if let Some(&workout_id) = workouts.first() {
            let dates = [0u64, 2, 4]
                .iter()
                .map(|offset| CalendarDate(start + Days::new(*offset)))
                .collect();
            let bulk = assignments
                .assign_workout(
                    &coach,
                    AssignWorkoutRequest {
                        client_id: demo_clients[1],
                        workout_id,
                        scheduled_date: None,
                        scheduled_dates: dates,
                        notes: None,
                    },
                )
                .await?;
            tracing::info!(
                assigned = bulk.assigned,
                failed = bulk.failed,
                "Demo workouts assigned"
            );
        }

        tracing::info!("Demo seeding completed!");
        Ok(())
    }

    async fn exercise_id(&self, name: &str) -> Result<Uuid> {
        let exercise = ExerciseService::new(self.pool.clone())
            .find_by_name(name)
            .await?
            .with_context(|| format!("catalog exercise '{}' missing", name))?;
        Ok(exercise.id)
    }

    async fn entries(
        &self,
        prescriptions: &[Prescription],
        extra_sets: i32,
    ) -> Result<Vec<ExerciseEntryInput>> {
        let mut entries = Vec::with_capacity(prescriptions.len());
        for (name, sets, reps, rest) in prescriptions {
            entries.push(ExerciseEntryInput {
                exercise_id: self.exercise_id(name).await?,
                sets: *sets + extra_sets,
                reps: Some(reps.to_string()),
                rest_seconds: Some(*rest),
                notes: None,
            });
        }
        Ok(entries)
    }

    async fn seed_workouts(&self, creator_id: Uuid) -> Result<Vec<Uuid>> {
        let service = WorkoutService::new(self.pool.clone());
        let templates: [(&str, &str, Difficulty, &[Prescription]); 3] = [
            (
                "Upper Body Blast",
                "Push and pull supersets",
                Difficulty::Intermediate,
                &[
                    ("Bench Press", 4, "8", 90),
                    ("Dumbbell Row", 4, "10", 90),
                    ("Push-up", 3, "AMRAP", 60),
                ],
            ),
            (
                "Leg Day Foundations",
                "Squat pattern and hinge basics",
                Difficulty::Beginner,
                &[
                    ("Goblet Squat", 3, "12", 60),
                    ("Romanian Deadlift", 3, "10", 90),
                    ("Walking Lunge", 2, "12", 60),
                ],
            ),
            (
                "Core & Conditioning",
                "Short finisher circuit",
                Difficulty::Beginner,
                &[
                    ("Kettlebell Swing", 4, "15", 45),
                    ("Plank", 3, "40s", 30),
                    ("Jump Rope", 3, "60s", 30),
                ],
            ),
        ];

        let mut ids = Vec::with_capacity(templates.len());
        for (name, description, difficulty, prescriptions) in templates {
            let workout = service
                .create_workout(
                    creator_id,
                    CreateWorkoutRequest {
                        name: name.to_string(),
                        description: Some(description.to_string()),
                        is_public: true,
                        difficulty: Some(difficulty),
                        estimated_duration: None,
                        exercises: self.entries(prescriptions, 0).await?,
                    },
                )
                .await?;
            ids.push(workout.workout.id);
        }

        tracing::info!(count = ids.len(), "Demo workouts seeded");
        Ok(ids)
    }

    async fn seed_program(&self, creator_id: Uuid) -> Result<Uuid> {
        let mut days = Vec::new();
        for week in 0..4 {
            // second half of the block adds a set to every exercise
            let extra_sets = if week >= 2 { 1 } else { 0 };
            for (weekday, (name, prescriptions)) in strength_week().iter().enumerate() {
                let day_number = week * 7 + weekday as i32 + 1;
                days.push(WorkoutDayInput {
                    day_number,
                    name: name.map(|n| format!("Week {} · {}", week + 1, n)),
                    is_rest_day: name.is_none(),
                    estimated_duration: None,
                    notes: None,
                    exercises: self.entries(prescriptions, extra_sets).await?,
                });
            }
        }

        let program = ProgramService::new(self.pool.clone())
            .create_program(
                creator_id,
                CreateProgramRequest {
                    name: DEMO_PROGRAM_NAME.to_string(),
                    description: Some(
                        "Four weeks of progressive full-body strength work".to_string(),
                    ),
                    total_days: 28,
                    is_public: true,
                    difficulty: Some(Difficulty::Intermediate),
                    days,
                },
            )
            .await?;

        tracing::info!(program_id = %program.program.id, "Demo program seeded");
        Ok(program.program.id)
    }
}
