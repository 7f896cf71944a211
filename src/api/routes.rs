use axum::{middleware, routing::get, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::admin::admin_routes;
use super::assignments::assignment_routes;
use super::auth::auth_routes;
use super::calendar::calendar_routes;
use super::clients::client_routes;
use super::exercises::exercise_routes;
use super::health::{health_check, readiness_check};
use super::import::import_routes;
use super::programs::program_routes;
use super::progress::progress_routes;
use super::workouts::workout_routes;
use crate::auth::{cors_layer, jwt_auth_middleware, security_headers_layer, AuthService};
use crate::config::AppConfig;
use crate::services::{
    AssignmentService, CalendarService, ClientService, ExerciseService, ImportService,
    ProgramService, ProgressService, UserService, WorkoutService,
};

/// Shared handler state; every service wraps the same pool
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth_service: AuthService,
    pub users: UserService,
    pub clients: ClientService,
    pub exercises: ExerciseService,
    pub workouts: WorkoutService,
    pub programs: ProgramService,
    pub assignments: AssignmentService,
    pub calendar: CalendarService,
    pub progress: ProgressService,
    pub imports: ImportService,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: PgPool, config: &AppConfig) -> Self {
        let exercises = ExerciseService::new(db.clone());
        let workouts = WorkoutService::new(db.clone());

        Self {
            auth_service: AuthService::new(db.clone(), &config.jwt_secret, config.session_ttl()),
            users: UserService::new(db.clone()),
            clients: ClientService::new(db.clone()),
            programs: ProgramService::new(db.clone()),
            assignments: AssignmentService::new(db.clone()),
            calendar: CalendarService::new(db.clone()),
            progress: ProgressService::new(db.clone()),
            imports: ImportService::new(exercises.clone(), workouts.clone()),
            exercises,
            workouts,
            secure_cookies: config.secure_cookies(),
            db,
        }
    }
}

/// Wraps every route of `router` in the session middleware.
/// Added last, so it runs before any role layer added earlier.
pub(crate) fn require_session(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        state.auth_service.clone(),
        jwt_auth_middleware,
    ))
}

pub fn create_routes(state: AppState, config: &AppConfig) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/exercises", exercise_routes(state.clone()))
        .nest("/workouts", workout_routes(state.clone()))
        .nest("/programs", program_routes(state.clone()))
        .nest("/clients", client_routes(state.clone()))
        .nest("/assignments", assignment_routes(state.clone()))
        .nest("/calendar", calendar_routes(state.clone()))
        .nest("/progress", progress_routes(state.clone()))
        .nest("/import", import_routes(state.clone()))
        .nest("/admin", admin_routes(state.clone()));

    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .with_state(state)
        .nest("/api/v1", api)
        .layer(security_headers_layer())
        .layer(cors_layer(&config.cors_origins, config.mirror_any_origin()))
        .layer(TraceLayer::new_for_http())
}
