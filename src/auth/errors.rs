use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::password::PasswordError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email already exists")]
    EmailAlreadyExists,
    #[error("Invalid session token")]
    InvalidToken,
    #[error("Session expired")]
    TokenExpired,
    #[error("Missing session")]
    MissingSession,
    #[error("Invalid authorization header format")]
    InvalidAuthHeaderFormat,
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Role cannot be self-assigned: {0}")]
    RoleNotAllowed(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Password validation failed: {0}")]
    PasswordValidation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHashing(PasswordError),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::HashingFailed | PasswordError::VerificationFailed => {
                AuthError::PasswordHashing(err)
            }
            policy => AuthError::PasswordValidation(policy.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "Email already exists"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid session token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
            AuthError::MissingSession => (StatusCode::UNAUTHORIZED, "Missing session"),
            AuthError::InvalidAuthHeaderFormat => {
                (StatusCode::UNAUTHORIZED, "Invalid authorization header format")
            }
            AuthError::InsufficientPermissions => {
                (StatusCode::FORBIDDEN, "Insufficient permissions")
            }
            AuthError::RoleNotAllowed(_) => (StatusCode::FORBIDDEN, "Role not allowed"),
            AuthError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
            AuthError::PasswordValidation(_) => {
                (StatusCode::BAD_REQUEST, "Password validation failed")
            }
            AuthError::Jwt(_) => (StatusCode::UNAUTHORIZED, "Token error"),
            AuthError::PasswordHashing(_) | AuthError::Database(_) => {
                tracing::error!(error = %self, "authentication backend failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error_message.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "message": message,
        }));

        (status, body).into_response()
    }
}
