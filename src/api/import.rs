use axum::{
    body::{to_bytes, Bytes},
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
    middleware,
    response::Json,
    routing::post,
    Extension, Router,
};
use axum_extra::extract::Multipart;

use super::routes::{require_session, AppState};
use crate::auth::{trainer_or_admin_middleware, UserSession};
use crate::error::{AppError, AppResult};
use crate::models::ImportReport;

/// Largest CSV accepted in one request
const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

/// Multipart form field carrying the CSV
const FILE_FIELD: &str = "file";

/// CSV import, trainers and admins only
pub fn import_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/exercises", post(import_exercises))
        .route("/workouts", post(import_workouts))
        .route_layer(middleware::from_fn(trainer_or_admin_middleware));

    require_session(router, &state).with_state(state)
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map_or(false, |parsed| parsed.type_() == mime::MULTIPART)
}

/// CSV bytes from either a raw body or the `file` field of a multipart form
async fn read_csv_payload(request: Request) -> AppResult<Bytes> {
    if !is_multipart(&request) {
        return to_bytes(request.into_body(), MAX_IMPORT_BYTES)
            .await
            .map_err(|_| AppError::Validation("CSV body is unreadable or too large".to_string()));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| AppError::Validation(rejection.to_string()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?
    {
        if field.name() == Some(FILE_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|err| AppError::Validation(err.to_string()))?;
            if data.len() > MAX_IMPORT_BYTES {
                return Err(AppError::Validation("CSV file is too large".to_string()));
            }
            return Ok(data);
        }
    }

    Err(AppError::Validation(format!(
        "multipart field `{}` is required",
        FILE_FIELD
    )))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn import_exercises(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    request: Request,
) -> AppResult<Json<ImportReport>> {
    let data = read_csv_payload(request).await?;
    Ok(Json(state.imports.import_exercises(&session, &data).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn import_workouts(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    request: Request,
) -> AppResult<Json<ImportReport>> {
    let data = read_csv_payload(request).await?;
    Ok(Json(state.imports.import_workouts(&session, &data).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_raw_csv_body_is_read() {
        let request = Request::builder()
            .header(CONTENT_TYPE, "text/csv")
            .body(Body::from("name,category\nPlank,core\n"))
            .unwrap();

        let data = read_csv_payload(request).await.unwrap();
        assert_eq!(&data[..], b"name,category\nPlank,core\n");
    }

    #[tokio::test]
    async fn test_multipart_file_field_is_read() {
        let body = "--XYZ\r\n\
                    Content-Disposition: form-data; name=\"file\"; filename=\"exercises.csv\"\r\n\
                    Content-Type: text/csv\r\n\r\n\
                    name,category\nPlank,core\n\r\n\
                    --XYZ--\r\n";
        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))
            .unwrap();

        let data = read_csv_payload(request).await.unwrap();
        assert_eq!(&data[..], b"name,category\nPlank,core\n");
    }

    #[tokio::test]
    async fn test_multipart_without_file_field_is_rejected() {
        let body = "--XYZ\r\n\
                    Content-Disposition: form-data; name=\"other\"\r\n\r\n\
                    value\r\n\
                    --XYZ--\r\n";
        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))
            .unwrap();

        assert!(matches!(read_csv_payload(request).await, Err(AppError::Validation(_))));
    }
}
