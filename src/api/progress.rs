use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Extension, Router,
};
use validator::Validate;

use super::routes::{require_session, AppState};
use crate::auth::UserSession;
use crate::error::AppResult;
use crate::models::{CreateProgressRequest, ProgressEntry, ProgressQuery};

pub fn progress_routes(state: AppState) -> Router {
    let router = Router::new().route("/", get(list_progress).post(record_progress));
    require_session(router, &state).with_state(state)
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn list_progress(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<ProgressQuery>,
) -> AppResult<Json<Vec<ProgressEntry>>> {
    Ok(Json(state.progress.list_progress(&session, &query).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn record_progress(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateProgressRequest>,
) -> AppResult<(StatusCode, Json<ProgressEntry>)> {
    request.validate()?;
    let entry = state.progress.record_progress(&session, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
