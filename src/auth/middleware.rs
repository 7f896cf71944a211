use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::auth::{extract_bearer_token, AuthError, AuthService, UserRole, UserSession};

/// Name of the http-only cookie holding the session token
pub const SESSION_COOKIE: &str = "session";

/// Session token from the `session` cookie, falling back to `Authorization: Bearer`
pub fn session_token_from_headers(headers: &HeaderMap) -> Result<String, AuthError> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Ok(cookie.value().to_string());
        }
    }

    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingSession)?;

    extract_bearer_token(auth_header).map(str::to_string)
}

/// Session middleware: resolves the requester and stores a `UserSession` extension
pub async fn jwt_auth_middleware(
    State(auth_service): State<AuthService>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = session_token_from_headers(request.headers())?;
    let session = auth_service.validate_session(&token).await?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}

fn session_role(request: &Request) -> Result<UserRole, AuthError> {
    request
        .extensions()
        .get::<UserSession>()
        .map(|session| session.role)
        .ok_or(AuthError::MissingSession)
}

/// Admin-only middleware
pub async fn admin_only_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    if session_role(&request)? != UserRole::Admin {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Trainer or Admin middleware
pub async fn trainer_or_admin_middleware(
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !session_role(&request)?.is_staff() {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// CORS for the browser front-end. Credentials require explicit origins.
pub fn cors_layer(allowed_origins: &[String], mirror_when_empty: bool) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    // an empty list allows no cross-origin callers unless mirroring is requested
    let allow_origin = if origins.is_empty() && mirror_when_empty {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Security headers middleware
pub fn security_headers_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    )
}

/// In-memory sliding window of failures per key, used for login attempts.
/// Only recorded failures count against the budget.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    failures: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_failures: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_failures: usize, window: Duration) -> Self {
        Self {
            failures: Arc::new(Mutex::new(HashMap::new())),
            max_failures,
            window,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drops expired attempts, and keys left without any
    fn sweep(&self, failures: &mut HashMap<String, Vec<Instant>>, now: Instant) {
        failures.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.window);
            !times.is_empty()
        });
    }

    /// True once `key` has used up its failure budget. Records nothing.
    pub fn is_limited(&self, key: &str) -> bool {
        let mut failures = self.lock();
        self.sweep(&mut failures, Instant::now());
        failures.get(key).map_or(false, |times| times.len() >= self.max_failures)
    }

    pub fn record_failure(&self, key: &str) {
        let mut failures = self.lock();
        let now = Instant::now();
        self.sweep(&mut failures, now);
        failures.entry(key.to_string()).or_default().push(now);
    }

    /// Forgets `key`, e.g. after a successful login
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }
}
