use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use validator::Validate;

use super::routes::{require_session, AppState};
use crate::auth::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, UserInfo, UserSession,
    SESSION_COOKIE,
};
use crate::error::AppResult;

/// Authentication routes
pub fn auth_routes(state: AppState) -> Router {
    let protected = require_session(
        Router::new()
            .route("/logout", post(logout))
            .route("/me", get(me)),
        &state,
    );

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Register a new user and start a session
#[tracing::instrument(skip(state, jar, request))]
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    request.validate()?;
    let response = state.auth_service.register(request).await?;
    let jar = jar.add(session_cookie(response.access_token.clone(), state.secure_cookies));

    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// Login user
#[tracing::instrument(skip(state, jar, request))]
async fn login(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    let client_ip = peer.map(|ConnectInfo(addr)| addr.ip());
    let response = state.auth_service.login(request, client_ip).await?;
    let jar = jar.add(session_cookie(response.access_token.clone(), state.secure_cookies));

    Ok((jar, Json(response)))
}

/// End the session: blacklist the token and clear the cookie
#[tracing::instrument(skip(state, jar, session), fields(user_id = %session.user_id))]
async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let response = state.auth_service.logout(&session).await?;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));

    Ok((jar, Json(response)))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
) -> AppResult<Json<UserInfo>> {
    Ok(Json(state.auth_service.current_user(&session).await?))
}
