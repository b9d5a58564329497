use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use common::auth::{AuthService, JwtService};
use common::config::Settings;
use common::db::repositories::{CompanyRepository, JobRepository, UserRepository};
use common::db::DbPool;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub jwt_service: JwtService,
    pub config: Arc<Settings>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new AppState instance
    pub fn new(db_pool: DbPool, config: Settings, metrics_handle: Option<PrometheusHandle>) -> Self {
        let jwt_service = JwtService::new(&config.auth.jwt_secret, config.auth.jwt_expiration_hours);

        Self {
            db_pool,
            jwt_service,
            config: Arc::new(config),
            metrics_handle,
        }
    }

    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.db_pool.clone())
    }

    pub fn companies(&self) -> CompanyRepository {
        CompanyRepository::new(self.db_pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.db_pool.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.jwt_service.clone(),
            self.users(),
            self.config.auth.bcrypt_cost,
        )
    }
}
