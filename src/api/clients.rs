use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::routes::{require_session, AppState};
use crate::auth::UserSession;
use crate::error::AppResult;
use crate::models::{
    AssignTrainerRequest, ClientProfile, ClientQuery, UpdateClientRequest,
    UpdateSubscriptionRequest,
};
use crate::services::access;

/// Client profiles, scoped to the requester
pub fn client_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(list_clients))
        .route("/me", get(my_profile))
        .route("/:id", get(get_client).patch(update_client))
        .route("/:id/claim", post(claim_client))
        .route("/:id/release", post(release_client))
        .route("/:id/trainer", put(assign_trainer))
        .route("/:id/subscription", put(update_subscription));

    require_session(router, &state).with_state(state)
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn list_clients(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<ClientQuery>,
) -> AppResult<Json<Vec<ClientProfile>>> {
    Ok(Json(state.clients.list_clients(&session, &query).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn my_profile(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<ClientProfile>> {
    Ok(Json(state.clients.own_profile(&session).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn get_client(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ClientProfile>> {
    Ok(Json(state.clients.get_profile(&session, id).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_client(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> AppResult<Json<ClientProfile>> {
    request.validate()?;
    Ok(Json(state.clients.update_client(&session, id, request).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn claim_client(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ClientProfile>> {
    Ok(Json(state.clients.claim_client(&session, id).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn release_client(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ClientProfile>> {
    Ok(Json(state.clients.release_client(&session, id).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn assign_trainer(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignTrainerRequest>,
) -> AppResult<Json<ClientProfile>> {
    access::require_admin(&session)?;
    Ok(Json(state.clients.assign_trainer(id, request).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_subscription(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> AppResult<Json<ClientProfile>> {
    access::require_admin(&session)?;
    request.validate()?;
    Ok(Json(state.clients.update_subscription(id, request).await?))
}
