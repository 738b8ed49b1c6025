//! Scoop API library.
//!
//! The catalog and customer REST API as a library, so the router can be
//! tested without binding a socket. The binary in `main.rs` only loads
//! configuration, sets up tracing and Sentry, and serves [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderName, Method, Request, StatusCode, header},
    routing::get,
};
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::middleware::{branch::BRANCH_HEADER, request_id::REQUEST_ID_HEADER};
use crate::state::AppState;

/// Build the full application: health checks, API routes and middleware.
///
/// Trailing slashes are trimmed before routing, so the result is wrapped in
/// `NormalizePath` rather than returned as a plain `Router`.
pub fn app(state: AppState) -> NormalizePath<Router> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(BRANCH_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                branch_id = tracing::field::Empty,
            )
        }))
        .layer(cors)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use axum::response::Response;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;

    /// State whose pool never connects; only routes that fail before touching
    /// the database are exercised here.
    fn test_state() -> AppState {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://scoop@localhost:1/scoop_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            db_max_connections: 1,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        };
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://scoop@localhost:1/scoop_test")
            .unwrap();
        AppState::new(config, pool)
    }

    async fn send(request: Request<Body>) -> Response {
        app(test_state()).oneshot(request).await.unwrap()
    }

    async fn get_path(uri: &str) -> Response {
        send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(uri: &str, body: &'static str) -> Response {
        send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn assert_bad_request(response: Response) -> String {
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        json["error"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_health() {
        let response = get_path("/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed() {
        let response = get_path("/health/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_non_positive_id_is_rejected() {
        let error = assert_bad_request(get_path("/api/products/0/images").await).await;
        assert_eq!(error, "Invalid product id: 0");

        assert_bad_request(get_path("/api/categories/-4/with-products").await).await;
        assert_bad_request(get_path("/api/bundles/0/pricing").await).await;
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_rejected() {
        assert_bad_request(get_path("/api/customers/abc").await).await;
    }

    #[tokio::test]
    async fn test_invalid_branch_header_is_rejected() {
        let response = send(
            Request::builder()
                .uri("/api/categories/with-products")
                .header(BRANCH_HEADER, "main-street")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let error = assert_bad_request(response).await;
        assert!(error.contains("X-Branch-Id"));
    }

    #[tokio::test]
    async fn test_empty_search_is_rejected() {
        assert_bad_request(get_path("/api/products/search?q=").await).await;
        assert_bad_request(get_path("/api/products/search").await).await;
        assert_bad_request(get_path("/api/bundles/search?name=%20").await).await;
    }

    #[tokio::test]
    async fn test_unknown_sort_column_is_rejected() {
        let error = assert_bad_request(get_path("/api/products?sort=secret").await).await;
        assert_eq!(error, "invalid sort column: secret");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_envelope() {
        assert_bad_request(post_json("/api/customers", "{").await).await;
    }

    #[tokio::test]
    async fn test_missing_required_field() {
        let error = assert_bad_request(
            post_json("/api/customers", r#"{"firstname": "Ada", "lastname": "L"}"#).await,
        )
        .await;
        assert_eq!(error, "email is required");

        let error = assert_bad_request(
            post_json(
                "/api/users/register-with-role",
                r#"{"email": "a@b.co", "password": "longenough"}"#,
            )
            .await,
        )
        .await;
        assert_eq!(error, "role is required");
    }

    #[tokio::test]
    async fn test_login_requires_password() {
        let error = assert_bad_request(
            post_json("/api/users/login-customer", r#"{"email": "a@b.co"}"#).await,
        )
        .await;
        assert_eq!(error, "password is required");
    }
}
