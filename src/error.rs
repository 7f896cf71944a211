use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn forbidden() -> Self {
        AppError::Forbidden("Insufficient permissions".to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // auth failures carry their own status mapping
        let err = match self {
            AppError::Auth(err) => return err.into_response(),
            other => other,
        };

        let (status, error) = match &err {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Database(sqlx::Error::RowNotFound) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Database(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
            {
                (StatusCode::CONFLICT, "conflict")
            }
            AppError::Database(_) | AppError::Internal(_) | AppError::Auth(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "request failed");
            "Internal server error".to_string()
        } else if status == StatusCode::CONFLICT && matches!(err, AppError::Database(_)) {
            "Resource is referenced by other records or already exists".to_string()
        } else if matches!(err, AppError::Database(sqlx::Error::RowNotFound)) {
            "Resource not found".to_string()
        } else {
            err.to_string()
        };

        let body = Json(json!({
            "error": error,
            "message": message,
        }));

        (status, body).into_response()
    }
}
