use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::routes::{require_session, AppState};
use crate::auth::UserSession;
use crate::error::AppResult;
use crate::models::{CreateExerciseRequest, Exercise, ExerciseQuery, UpdateExerciseRequest};
use crate::services::access;

/// Exercise catalog: readable by every role, written by staff
pub fn exercise_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(list_exercises).post(create_exercise))
        .route(
            "/:id",
            get(get_exercise).patch(update_exercise).delete(delete_exercise),
        );

    require_session(router, &state).with_state(state)
}

#[tracing::instrument(skip(state, _session))]
async fn list_exercises(
    State(state): State<AppState>,
    Extension(_session): Extension<UserSession>,
    Query(query): Query<ExerciseQuery>,
) -> AppResult<Json<Vec<Exercise>>> {
    Ok(Json(state.exercises.list_exercises(&query).await?))
}

#[tracing::instrument(skip(state, _session))]
async fn get_exercise(
    State(state): State<AppState>,
    Extension(_session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Exercise>> {
    Ok(Json(state.exercises.get_exercise(id).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn create_exercise(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateExerciseRequest>,
) -> AppResult<(StatusCode, Json<Exercise>)> {
    access::require_staff(&session)?;
    request.validate()?;

    let exercise = state
        .exercises
        .create_exercise(Some(session.user_id), request)
        .await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_exercise(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateExerciseRequest>,
) -> AppResult<Json<Exercise>> {
    access::require_staff(&session)?;
    request.validate()?;

    Ok(Json(state.exercises.update_exercise(&session, id, request).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn delete_exercise(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    access::require_staff(&session)?;
    state.exercises.delete_exercise(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
