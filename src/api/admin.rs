use axum::{
    extract::{Query, State},
    middleware,
    response::Json,
    routing::get,
    Router,
};

use super::routes::{require_session, AppState};
use crate::auth::{admin_only_middleware, UserInfo};
use crate::error::AppResult;
use crate::models::UserQuery;

/// Admin endpoints
pub fn admin_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/users", get(list_users))
        .route("/trainers", get(list_trainers))
        .route_layer(middleware::from_fn(admin_only_middleware));

    require_session(router, &state).with_state(state)
}

/// List users, optionally by role
#[tracing::instrument(skip(state))]
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<UserInfo>>> {
    let users = state.users.list_users(&query).await?;
    Ok(Json(users.iter().map(|user| user.info()).collect()))
}

/// Trainers a client can be reassigned to
#[tracing::instrument(skip(state))]
async fn list_trainers(State(state): State<AppState>) -> AppResult<Json<Vec<UserInfo>>> {
    let trainers = state.users.list_trainers().await?;
    Ok(Json(trainers.iter().map(|user| user.info()).collect()))
}
