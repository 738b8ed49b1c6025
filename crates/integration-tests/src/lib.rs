//! HTTP integration tests for the Scoop API.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and seed a database, then start the API
//! cargo run -p scoop-cli -- migrate
//! cargo run -p scoop-cli -- seed catalog -f demo/catalog.yaml
//! cargo run -p scoop-api
//!
//! # Run the ignored integration tests against it
//! cargo test -p scoop-integration-tests -- --ignored
//! ```
//!
//! `SCOOP_API_URL` overrides the default `http://localhost:8080`.

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("SCOOP_API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Full URL for an API path.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A plain HTTP client.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// An email address no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", uuid::Uuid::new_v4().simple())
}

/// Assert the status and return the parsed envelope.
///
/// # Panics
///
/// Panics if the status differs or the body is not JSON.
pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    let actual = response.status();
    let body: Value = response.json().await.expect("Response is not JSON");
    assert_eq!(actual, status, "unexpected status, body: {body}");
    body
}

/// GET a path and return the envelope, asserting 200.
///
/// # Panics
///
/// Panics if the request fails or the status is not 200.
pub async fn get_ok(client: &Client, path: &str) -> Value {
    let response = client
        .get(url(path))
        .send()
        .await
        .expect("Request failed");
    let body = expect_json(response, StatusCode::OK).await;
    assert_eq!(body["success"], true);
    body
}
