use axum::{
    extract::{Path, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

use common::middleware::{check_admin, check_correct_user_or_admin, AuthenticatedUser};

use crate::handlers::ErrorResponse;

/// Route guard: admins only
#[tracing::instrument(skip(req, next))]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, ErrorResponse> {
    check_admin(req.extensions().get::<AuthenticatedUser>())?;
    Ok(next.run(req).await)
}

/// Route guard: the `:username` path segment must be the caller, unless the caller is an admin
#[tracing::instrument(skip(params, req, next))]
pub async fn require_correct_user_or_admin(
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    let username = params.get("username").map(String::as_str).unwrap_or_default();
    check_correct_user_or_admin(req.extensions().get::<AuthenticatedUser>(), username)?;
    Ok(next.run(req).await)
}
