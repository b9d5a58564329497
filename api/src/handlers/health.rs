use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::handlers::ErrorResponse;
use crate::state::AppState;
use common::errors::AppError;

/// Health check endpoint; pings the database
#[tracing::instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ErrorResponse> {
    state.db_pool.health_check().await.map_err(AppError::from)?;
    Ok(Json(json!({ "status": "ok" })))
}
