use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    jobs::{
        dto::{DeletedJobResponse, JobPayload, JobResponse, JobStats},
        services,
    },
    json::ApiJson,
    state::AppState,
};

pub fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/stats", get(job_stats))
        .route("/jobs/:id", put(update_job).delete(delete_job))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_jobs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<JobResponse>>, AppError> {
    let jobs = services::list_jobs(state.jobs.as_ref(), user.id).await?;
    Ok(Json(jobs))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn job_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<JobStats>, AppError> {
    let stats = services::job_stats(state.jobs.as_ref(), user.id).await?;
    Ok(Json(stats))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<JobPayload>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    let job = services::create_job(state.jobs.as_ref(), user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[instrument(skip_all, fields(user_id = %user.id, job_id = %id))]
pub async fn update_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<JobPayload>,
) -> Result<Json<JobResponse>, AppError> {
    let job = services::update_job(state.jobs.as_ref(), user.id, &id, payload).await?;
    Ok(Json(job))
}

#[instrument(skip_all, fields(user_id = %user.id, job_id = %id))]
pub async fn delete_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedJobResponse>, AppError> {
    let deleted = services::delete_job(state.jobs.as_ref(), user.id, &id).await?;
    Ok(Json(deleted))
}
