use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use common::middleware::AuthenticatedUser;

use crate::state::AppState;

/// Attach the caller identity when a valid bearer token is present
///
/// Never rejects: missing or invalid tokens leave the request anonymous and the route
/// guards decide.
#[tracing::instrument(skip(state, req, next))]
pub async fn authenticate_jwt(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    if let Some(token) = token {
        match state.jwt_service.decode_token(&token) {
            Ok(claims) => {
                tracing::debug!(username = %claims.username, "Request authenticated");
                req.extensions_mut().insert(AuthenticatedUser(claims));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
            }
        }
    }

    next.run(req).await
}
