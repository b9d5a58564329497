use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::handlers::{ErrorResponse, PathParams, ValidatedJson, ValidatedQuery};
use crate::state::AppState;
use common::models::{JobFilter, JobUpdate, NewJob};

/// Create a job (admin)
#[tracing::instrument(skip(state, job))]
pub async fn create_job(
    State(state): State<AppState>,
    ValidatedJson(job): ValidatedJson<NewJob>,
) -> Result<(StatusCode, Json<Value>), ErrorResponse> {
    let job = state.jobs().create(&job).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}

/// List jobs matching `?title&minSalary&hasEquity`
#[tracing::instrument(skip(state))]
pub async fn list_jobs(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<JobFilter>,
) -> Result<Json<Value>, ErrorResponse> {
    let jobs = state.jobs().find_all(&filter).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

#[tracing::instrument(skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    PathParams(id): PathParams<i32>,
) -> Result<Json<Value>, ErrorResponse> {
    let job = state.jobs().get(id).await?;
    Ok(Json(json!({ "job": job })))
}

/// Partially update a job (admin)
#[tracing::instrument(skip(state, patch))]
pub async fn update_job(
    State(state): State<AppState>,
    PathParams(id): PathParams<i32>,
    ValidatedJson(patch): ValidatedJson<JobUpdate>,
) -> Result<Json<Value>, ErrorResponse> {
    let job = state.jobs().update(id, patch).await?;
    Ok(Json(json!({ "job": job })))
}

/// Delete a job (admin)
#[tracing::instrument(skip(state))]
pub async fn delete_job(
    State(state): State<AppState>,
    PathParams(id): PathParams<i32>,
) -> Result<Json<Value>, ErrorResponse> {
    state.jobs().remove(id).await?;
    Ok(Json(json!({ "deleted": id })))
}
