use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::routes::{require_session, AppState};
use crate::auth::UserSession;
use crate::error::AppResult;
use crate::models::{
    AssignProgramRequest, AssignWorkoutRequest, AssignmentQuery, BulkAssignResponse,
    ClientProgramView, ClientWorkout, ClientWorkoutProgram, ClientWorkoutView,
    UpdateProgramAssignmentRequest, UpdateWorkoutAssignmentRequest,
};

/// Workout and program assignments, scoped to the requester
pub fn assignment_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/workouts", get(list_workout_assignments).post(assign_workout))
        .route(
            "/workouts/:id",
            patch(update_workout_assignment).delete(delete_workout_assignment),
        )
        .route("/programs", get(list_program_assignments).post(assign_program))
        .route(
            "/programs/:id",
            patch(update_program_assignment).delete(delete_program_assignment),
        );

    require_session(router, &state).with_state(state)
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn list_workout_assignments(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<AssignmentQuery>,
) -> AppResult<Json<Vec<ClientWorkoutView>>> {
    Ok(Json(
        state
            .assignments
            .list_workout_assignments(&session, &query)
            .await?,
    ))
}

/// Single or bulk assignment; 201 when at least one date was stored
#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn assign_workout(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<AssignWorkoutRequest>,
) -> AppResult<(StatusCode, Json<BulkAssignResponse>)> {
    request.validate()?;
    let response = state.assignments.assign_workout(&session, request).await?;

    let status = if response.assigned > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(response)))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_workout_assignment(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkoutAssignmentRequest>,
) -> AppResult<Json<ClientWorkout>> {
    request.validate()?;
    Ok(Json(
        state
            .assignments
            .update_workout_assignment(&session, id, request)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn delete_workout_assignment(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.assignments.delete_workout_assignment(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn list_program_assignments(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<AssignmentQuery>,
) -> AppResult<Json<Vec<ClientProgramView>>> {
    Ok(Json(
        state
            .assignments
            .list_program_assignments(&session, &query)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn assign_program(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<AssignProgramRequest>,
) -> AppResult<(StatusCode, Json<ClientWorkoutProgram>)> {
    request.validate()?;
    let assignment = state.assignments.assign_program(&session, request).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_program_assignment(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProgramAssignmentRequest>,
) -> AppResult<Json<ClientWorkoutProgram>> {
    request.validate()?;
    Ok(Json(
        state
            .assignments
            .update_program_assignment(&session, id, request)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn delete_program_assignment(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.assignments.delete_program_assignment(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
