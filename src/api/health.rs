use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use super::routes::AppState;

/// Liveness: the process is up and serving
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "coachdesk",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Readiness: the database answers
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "ready", "database": "ok" }))),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "database": "unreachable" })),
            )
        }
    }
}
