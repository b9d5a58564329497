use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::handlers::{ErrorResponse, ValidatedJson};
use crate::state::AppState;
use common::models::{Credentials, NewUser, RegisterUser};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Exchange username and password for a token
#[tracing::instrument(skip(state, credentials), fields(username = %credentials.username))]
pub async fn get_token(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> Result<Json<TokenResponse>, ErrorResponse> {
    let auth = state.auth_service();
    let user = auth
        .authenticate(&credentials.username, &credentials.password)
        .await?;
    let token = auth.issue_token(&user)?;
    Ok(Json(TokenResponse { token }))
}

/// Self-service signup; never grants admin
#[tracing::instrument(skip(state, registration), fields(username = %registration.username))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(registration): ValidatedJson<RegisterUser>,
) -> Result<(StatusCode, Json<TokenResponse>), ErrorResponse> {
    let auth = state.auth_service();
    let user = auth.register(&NewUser::from(registration)).await?;
    let token = auth.issue_token(&user)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}
