mod auth;
mod rbac;

pub use auth::authenticate_jwt;
pub use rbac::{require_admin, require_correct_user_or_admin};
