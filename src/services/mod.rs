// Business logic services

pub mod access;
pub mod assignment_service;
pub mod calendar_service;
pub mod client_service;
pub mod exercise_service;
pub mod import_service;
pub mod program_service;
pub mod progress_service;
pub mod schedule;
pub mod user_service;
pub mod workout_service;

pub use access::AccessScope;
pub use assignment_service::AssignmentService;
pub use calendar_service::CalendarService;
pub use client_service::ClientService;
pub use exercise_service::ExerciseService;
pub use import_service::ImportService;
pub use program_service::ProgramService;
pub use progress_service::ProgressService;
pub use user_service::UserService;
pub use workout_service::WorkoutService;
