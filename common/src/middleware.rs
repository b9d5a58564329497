// Request identity and audit logging for Axum

use crate::errors::AuthError;
use crate::models::UserClaims;
use crate::telemetry;
use axum::{
    extract::{MatchedPath, Request},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{instrument, warn};

/// Extension type to store authenticated user claims in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub UserClaims);

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.0.username
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin
    }
}

/// Require an authenticated caller
pub fn check_logged_in(user: Option<&AuthenticatedUser>) -> Result<&AuthenticatedUser, AuthError> {
    user.ok_or_else(|| {
        warn!("Request without valid credentials");
        AuthError::MissingCredentials
    })
}

/// Require an authenticated admin
pub fn check_admin(user: Option<&AuthenticatedUser>) -> Result<(), AuthError> {
    let user = check_logged_in(user)?;
    if !user.is_admin() {
        warn!(username = %user.username(), "Admin required");
        return Err(AuthError::InsufficientPermissions("admin".to_string()));
    }
    Ok(())
}

/// Require the caller to be `username` or an admin
pub fn check_correct_user_or_admin(
    user: Option<&AuthenticatedUser>,
    username: &str,
) -> Result<(), AuthError> {
    let user = check_logged_in(user)?;
    if !user.is_admin() && user.username() != username {
        warn!(
            username = %user.username(),
            target = %username,
            "Caller is neither the target user nor an admin"
        );
        return Err(AuthError::InsufficientPermissions(format!(
            "user {}",
            username
        )));
    }
    Ok(())
}

/// Metrics label for requests that matched no route
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Audit logging middleware
///
/// Logs one line per request with the caller identity and the derived operation, and
/// records the HTTP request metrics.
#[instrument(skip(request, next))]
pub async fn audit_logging_middleware(request: Request, next: Next) -> Response {
    let identity = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| (user.0.username.clone(), user.0.is_admin));

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);
    let resource_id = extract_resource_id(&path);
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let operation = determine_operation(&method, &path);

    telemetry::record_http_request(
        method.as_str(),
        &route,
        status,
        started.elapsed().as_secs_f64(),
    );

    if let Some((username, is_admin)) = identity {
        tracing::info!(
            username = %username,
            is_admin = is_admin,
            method = %method,
            path = %path,
            resource_id = ?resource_id,
            status = status,
            operation = %operation,
            "Audit log: User operation"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            resource_id = ?resource_id,
            status = status,
            operation = %operation,
            "Audit log: Anonymous request"
        );
    }

    response
}

/// Route template the router matched, or `UNMATCHED_ROUTE`
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// Identifier segment following the resource collection
/// Examples: /jobs/12 -> Some("12"), /users/u1/jobs/3 -> Some("u1"), /jobs -> None
fn extract_resource_id(path: &str) -> Option<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .nth(1)
        .map(str::to_string)
}

/// Determine operation type from HTTP method and path
fn determine_operation(method: &Method, path: &str) -> String {
    if path.starts_with("/auth/token") {
        return "login".to_string();
    }
    if path.starts_with("/auth/register") {
        return "register".to_string();
    }
    if path.starts_with("/users/") && path.contains("/jobs/") && *method == Method::POST {
        return "apply_job".to_string();
    }

    let resource = if path.starts_with("/jobs") {
        "job"
    } else if path.starts_with("/companies") {
        "company"
    } else if path.starts_with("/users") {
        "user"
    } else if path.starts_with("/health") {
        "health"
    } else if path.starts_with("/metrics") {
        "metrics"
    } else {
        "unknown"
    };

    match method.as_str() {
        "GET" => format!("read_{}", resource),
        "POST" => format!("create_{}", resource),
        "PUT" | "PATCH" => format!("update_{}", resource),
        "DELETE" => format!("delete_{}", resource),
        _ => format!("unknown_{}", resource),
    }
}
