//! Common Test Utilities

use axum::routing::get;
use axum::{body::Body, http::Request, Router};
use tower::ServiceExt;

use match_server::presentation::http::handlers::health;

/// Test application exposing the stateless routes. Database-backed routes
/// need a live Postgres and are exercised separately.
pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn stateless() -> Self {
        let router = Router::new()
            .route("/health", get(health::health_check))
            .route("/health/live", get(health::liveness));

        Self { router }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Read a response body into JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
