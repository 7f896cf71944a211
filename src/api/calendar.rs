use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Extension, Router,
};

use super::routes::{require_session, AppState};
use crate::auth::UserSession;
use crate::error::AppResult;
use crate::models::{CalendarQuery, CalendarResponse};

pub fn calendar_routes(state: AppState) -> Router {
    require_session(Router::new().route("/", get(get_calendar)), &state).with_state(state)
}

/// Day-cells between `from` and `to`, inclusive
#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn get_calendar(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<CalendarResponse>> {
    Ok(Json(state.calendar.calendar(&session, query).await?))
}
