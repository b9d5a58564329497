// Shared library for the job board API: models, persistence, auth, telemetry

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod sql;
pub mod telemetry;
pub mod validation;
