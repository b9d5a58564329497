use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::handlers::{ErrorResponse, PathParams, ValidatedJson};
use crate::state::AppState;
use common::models::{NewUser, UserUpdate};

/// Create a user as an admin; the new user may itself be an admin
///
/// Responds with the user and a token for them.
#[tracing::instrument(skip(state, new_user), fields(username = %new_user.username))]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(new_user): ValidatedJson<NewUser>,
) -> Result<(StatusCode, Json<Value>), ErrorResponse> {
    let auth = state.auth_service();
    let user = auth.register(&new_user).await?;
    let token = auth.issue_token(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "token": token })),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, ErrorResponse> {
    let users = state.users().find_all().await?;
    Ok(Json(json!({ "users": users })))
}

/// User details including applied job ids
#[tracing::instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    PathParams(username): PathParams<String>,
) -> Result<Json<Value>, ErrorResponse> {
    let user = state.users().get(&username).await?;
    Ok(Json(json!({ "user": user })))
}

#[tracing::instrument(skip(state, patch))]
pub async fn update_user(
    State(state): State<AppState>,
    PathParams(username): PathParams<String>,
    ValidatedJson(patch): ValidatedJson<UserUpdate>,
) -> Result<Json<Value>, ErrorResponse> {
    let user = state.auth_service().update_user(&username, patch).await?;
    Ok(Json(json!({ "user": user })))
}

#[tracing::instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    PathParams(username): PathParams<String>,
) -> Result<Json<Value>, ErrorResponse> {
    state.users().remove(&username).await?;
    Ok(Json(json!({ "deleted": username })))
}

/// Apply the user to a job
#[tracing::instrument(skip(state))]
pub async fn apply_to_job(
    State(state): State<AppState>,
    PathParams((username, job_id)): PathParams<(String, i32)>,
) -> Result<Json<Value>, ErrorResponse> {
    state.users().apply_to_job(&username, job_id).await?;
    Ok(Json(json!({ "applied": job_id })))
}
