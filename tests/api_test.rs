mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use coachdesk::auth::{JwtService, UserRole};
use common::{test_app, token_for, unreachable_pool};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> Router {
    common::init_test_logging();
    test_app(unreachable_pool())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "coachdesk");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let response = app()
        .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["database"], "unreachable");
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    for uri in [
        "/api/v1/auth/me",
        "/api/v1/exercises",
        "/api/v1/workouts",
        "/api/v1/programs",
        "/api/v1/clients",
        "/api/v1/assignments/workouts",
        "/api/v1/calendar?from=2024-01-01&to=2024-01-31",
        "/api/v1/progress",
        "/api/v1/admin/users",
    ] {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_import_requires_session() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/import/exercises")
                .header(header::CONTENT_TYPE, "text/csv")
                .body(Body::from("name,category\nSquat,strength\n"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let forged = JwtService::new("some-other-secret", chrono::Duration::hours(1))
        .create_session_token(Uuid::new_v4(), "admin@example.com", "Admin", UserRole::Admin)
        .unwrap();

    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/users")
                .header(header::AUTHORIZATION, format!("Bearer {}", forged))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let expired = JwtService::new(common::TEST_JWT_SECRET, chrono::Duration::hours(-2))
        .create_session_token(Uuid::new_v4(), "trainer@example.com", "Trainer", UserRole::Trainer)
        .unwrap();

    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/workouts")
                .header(header::COOKIE, format!("session={}", expired))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_header() {
    let token = token_for(Uuid::new_v4(), UserRole::Admin);

    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/trainers")
                .header(header::AUTHORIZATION, format!("Token {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_incomplete_body() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_route() {
    let response = app()
        .oneshot(Request::builder().uri("/api/v1/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/workouts")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}
