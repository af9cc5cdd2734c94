//! Health Check API Tests

use axum::http::StatusCode;

use crate::common::{body_json, TestApp};

#[tokio::test]
async fn health_check_returns_ok() {
    let app = TestApp::stateless();

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_check_reports_status_and_version() {
    let app = TestApp::stateless();

    let response = app.get("/health").await;
    let json = body_json(response).await;

    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
}

/// Liveness stays 200 regardless of dependency state.
#[tokio::test]
async fn liveness_probe_returns_ok() {
    let app = TestApp::stateless();

    let response = app.get("/health/live").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "alive");
}
