use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, put},
    Extension, Router,
};
use uuid::Uuid;
use validator::Validate;

use super::routes::{require_session, AppState};
use crate::auth::{trainer_or_admin_middleware, UserSession};
use crate::error::AppResult;
use crate::models::{
    CreateProgramRequest, ProgramDetail, ProgramQuery, UpdateProgramRequest, UpsertDayRequest,
    WorkoutDayDetail, WorkoutProgram,
};

/// Program routes, trainers and admins only
pub fn program_routes(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(list_programs).post(create_program))
        .route(
            "/:id",
            get(get_program).patch(update_program).delete(delete_program),
        )
        .route("/:id/days/:day_number", put(upsert_day))
        .route_layer(middleware::from_fn(trainer_or_admin_middleware));

    require_session(router, &state).with_state(state)
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn list_programs(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Query(query): Query<ProgramQuery>,
) -> AppResult<Json<Vec<WorkoutProgram>>> {
    Ok(Json(state.programs.list_programs(&session, &query).await?))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn get_program(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProgramDetail>> {
    Ok(Json(state.programs.get_program(&session, id).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn create_program(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Json(request): Json<CreateProgramRequest>,
) -> AppResult<(StatusCode, Json<ProgramDetail>)> {
    request.validate()?;
    let program = state.programs.create_program(session.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn update_program(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProgramRequest>,
) -> AppResult<Json<ProgramDetail>> {
    request.validate()?;
    Ok(Json(state.programs.update_program(&session, id, request).await?))
}

#[tracing::instrument(skip(state, session, request), fields(user_id = %session.user_id))]
async fn upsert_day(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path((id, day_number)): Path<(Uuid, i32)>,
    Json(request): Json<UpsertDayRequest>,
) -> AppResult<Json<WorkoutDayDetail>> {
    request.validate()?;
    Ok(Json(
        state
            .programs
            .upsert_day(&session, id, day_number, request)
            .await?,
    ))
}

#[tracing::instrument(skip(state, session), fields(user_id = %session.user_id))]
async fn delete_program(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.programs.delete_program(&session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
