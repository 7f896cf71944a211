use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::routes::{require_session, AppState};
use crate::auth::{trainer_or_admin_middleware, UserSession};
use crate::error::AppResult;
use crate::models::{CreateWorkoutRequest, UpdateWorkoutRequest, Workout, WorkoutDetail, WorkoutQuery};

/// Workout routes, trainers and admins only
pub fn workout_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(list_workouts).post(create_workout))
        .route(
            "/:id",
            get(get_workout).patch(update_workout).delete(delete_workout),
        )
        .route_layer(middleware::from_fn(trainer_or_admin_middleware));

    require_session(router, &state).with_state(state)
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn list_workouts(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<WorkoutQuery>,
) -> AppResult<Json<Vec<Workout>>> {
    Ok(Json(state.workouts.list_workouts(&session, &query).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn get_workout(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WorkoutDetail>> {
    Ok(Json(state.workouts.get_workout(&session, id).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn create_workout(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateWorkoutRequest>,
) -> AppResult<(StatusCode, Json<WorkoutDetail>)> {
    request.validate()?;
    let workout = state.workouts.create_workout(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_workout(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkoutRequest>,
) -> AppResult<Json<WorkoutDetail>> {
    request.validate()?;
    Ok(Json(state.workouts.update_workout(&session, id, request).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn delete_workout(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.workouts.delete_workout(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
