use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use common::middleware::audit_logging_middleware;

use crate::handlers;
use crate::middleware::{authenticate_jwt, require_admin, require_correct_user_or_admin};
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/auth/token", post(handlers::auth::get_token))
        .route("/auth/register", post(handlers::auth::register));

    let company_routes = Router::new()
        .route("/companies", get(handlers::companies::list_companies))
        .route(
            "/companies",
            post(handlers::companies::create_company).route_layer(from_fn(require_admin)),
        )
        .route("/companies/:handle", get(handlers::companies::get_company))
        .route(
            "/companies/:handle",
            patch(handlers::companies::update_company)
                .delete(handlers::companies::delete_company)
                .route_layer(from_fn(require_admin)),
        );

    let job_routes = Router::new()
        .route("/jobs", get(handlers::jobs::list_jobs))
        .route(
            "/jobs",
            post(handlers::jobs::create_job).route_layer(from_fn(require_admin)),
        )
        .route("/jobs/:id", get(handlers::jobs::get_job))
        .route(
            "/jobs/:id",
            patch(handlers::jobs::update_job)
                .delete(handlers::jobs::delete_job)
                .route_layer(from_fn(require_admin)),
        );

    let user_routes = Router::new()
        .route(
            "/users",
            post(handlers::users::create_user)
                .get(handlers::users::list_users)
                .route_layer(from_fn(require_admin)),
        )
        .route(
            "/users/:username",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user)
                .route_layer(from_fn(require_correct_user_or_admin)),
        )
        .route(
            "/users/:username/jobs/:id",
            post(handlers::users::apply_to_job)
                .route_layer(from_fn(require_correct_user_or_admin)),
        );

    let ops_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics_handler));

    Router::new()
        .merge(auth_routes)
        .merge(company_routes)
        .merge(job_routes)
        .merge(user_routes)
        .merge(ops_routes)
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn_with_state(state.clone(), authenticate_jwt))
                .layer(from_fn(audit_logging_middleware)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use common::config::Settings;
    use common::db::DbPool;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// State backed by a pool that never connects; only paths that fail before
    /// touching storage are exercised here.
    fn test_state() -> AppState {
        let mut settings = Settings::default();
        settings.database.url = "postgresql://localhost:1/unreachable".to_string();
        settings.database.min_connections = 0;
        settings.database.connect_timeout_seconds = 1;
        let pool = DbPool::connect_lazy(&settings.database).unwrap();
        AppState::new(pool, settings, None)
    }

    fn token(state: &AppState, username: &str, is_admin: bool) -> String {
        state.jwt_service.encode_token(username, is_admin).unwrap()
    }

    async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        bearer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(bearer) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = create_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_with_error_body() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/no-such-path", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["status"], 404);
    }

    #[tokio::test]
    async fn test_create_job_requires_token() {
        let state = test_state();
        let job = json!({"title": "J", "salary": 1, "equity": "0.1", "companyHandle": "c1"});
        let (status, body) = send(&state, Method::POST, "/jobs", None, Some(job)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["status"], 401);
    }

    #[tokio::test]
    async fn test_create_job_rejects_non_admin() {
        let state = test_state();
        let u1 = token(&state, "u1", false);
        let job = json!({"title": "J", "salary": 1, "equity": "0.1", "companyHandle": "c1"});
        let (status, _) = send(&state, Method::POST, "/jobs", Some(&u1), Some(job)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_is_anonymous() {
        let state = test_state();
        let (status, _) = send(
            &state,
            Method::DELETE,
            "/jobs/1",
            Some("not-a-jwt"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_job_rejects_invalid_shape() {
        let state = test_state();
        let admin = token(&state, "admin", true);
        let job = json!({"title": "J", "salary": "not-a-number", "companyHandle": "c1"});
        let (status, body) = send(&state, Method::POST, "/jobs", Some(&admin), Some(job)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);
    }

    #[tokio::test]
    async fn test_create_job_rejects_unknown_field() {
        let state = test_state();
        let admin = token(&state, "admin", true);
        let job = json!({"title": "J", "companyHandle": "c1", "bonus": 10});
        let (status, _) = send(&state, Method::POST, "/jobs", Some(&admin), Some(job)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_job_rejects_immutable_fields_before_storage() {
        let state = test_state();
        let admin = token(&state, "admin", true);

        let (status, body) = send(
            &state,
            Method::PATCH,
            "/jobs/1",
            Some(&admin),
            Some(json!({"companyHandle": "c2"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Not allowed to change id or companyHandle"
        );

        let (status, _) = send(
            &state,
            Method::PATCH,
            "/jobs/1",
            Some(&admin),
            Some(json!({"id": 99})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_400_with_error_body() {
        let state = test_state();
        let (status, body) = send(&state, Method::GET, "/jobs/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);

        let u1 = token(&state, "u1", false);
        let (status, body) =
            send(&state, Method::POST, "/users/u1/jobs/abc", Some(&u1), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["status"], 400);
    }

    #[tokio::test]
    async fn test_update_job_rejects_null_immutable_fields() {
        let state = test_state();
        let admin = token(&state, "admin", true);

        for patch in [
            json!({"id": null, "title": "x"}),
            json!({"companyHandle": null, "salary": 1}),
        ] {
            let (status, body) =
                send(&state, Method::PATCH, "/jobs/1", Some(&admin), Some(patch)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(
                body["error"]["message"],
                "Not allowed to change id or companyHandle"
            );
        }
    }

    #[tokio::test]
    async fn test_update_job_with_empty_patch_is_no_data() {
        let state = test_state();
        let admin = token(&state, "admin", true);
        let (status, body) =
            send(&state, Method::PATCH, "/jobs/1", Some(&admin), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "No data");
    }

    #[tokio::test]
    async fn test_list_jobs_rejects_bad_query() {
        let state = test_state();
        let (status, _) = send(&state, Method::GET, "/jobs?minSalary=abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&state, Method::GET, "/jobs?nope=1", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&state, Method::GET, "/jobs?minSalary=-1", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_companies_rejects_inverted_range() {
        let state = test_state();
        let (status, _) = send(
            &state,
            Method::GET,
            "/companies?minEmployees=10&maxEmployees=5",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_user_routes_require_same_user_or_admin() {
        let state = test_state();
        let u2 = token(&state, "u2", false);

        let (status, _) = send(&state, Method::GET, "/users/u1", Some(&u2), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&state, Method::GET, "/users/u1", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&state, Method::POST, "/users/u1/jobs/1", Some(&u2), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&state, Method::GET, "/users", Some(&u2), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_user_rejects_username_change() {
        let state = test_state();
        let u1 = token(&state, "u1", false);
        let (status, body) = send(
            &state,
            Method::PATCH,
            "/users/u1",
            Some(&u1),
            Some(json!({"username": "other"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Not allowed to change username");
    }

    #[tokio::test]
    async fn test_token_requires_password() {
        let state = test_state();
        let (status, _) = send(
            &state,
            Method::POST,
            "/auth/token",
            None,
            Some(json!({"username": "u1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_rejects_is_admin() {
        let state = test_state();
        let body = json!({
            "username": "new",
            "password": "password",
            "firstName": "first",
            "lastName": "last",
            "email": "new@email.com",
            "isAdmin": true
        });
        let (status, _) = send(&state, Method::POST, "/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_label_requests_by_route_template() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let mut state = test_state();
        state.metrics_handle = Some(recorder.handle());
        let _guard = metrics::set_default_local_recorder(&recorder);

        for uri in ["/jobs/1", "/jobs/2", "/no-such-path"] {
            send(&state, Method::DELETE, uri, None, None).await;
        }

        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let rendered = String::from_utf8(bytes.to_vec()).unwrap();

        let job_series: Vec<&str> = rendered
            .lines()
            .filter(|line| line.starts_with("http_requests_total{"))
            .filter(|line| line.contains(r#"method="DELETE""#))
            .filter(|line| line.contains("/jobs"))
            .collect();
        assert_eq!(job_series.len(), 1);
        assert!(job_series[0].contains(r#"path="/jobs/:id""#));
        assert!(job_series[0].ends_with(" 2"));
        assert!(rendered.contains(r#"path="unmatched""#));
        assert!(!rendered.contains("/no-such-path"));
    }
}
