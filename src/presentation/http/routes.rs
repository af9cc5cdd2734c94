//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(state.clone()))
        // WebSocket endpoint; authentication happens in-band
        .route("/ws", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        .with_state(state)
}

/// API routes (all protected)
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/connection", connection_routes())
        .nest("/chat", chat_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn connection_routes() -> Router<AppState> {
    Router::new()
        .route("/send-request", post(handlers::connection::send_request))
        .route(
            "/pending-requests",
            get(handlers::connection::pending_requests),
        )
        .route("/matches", get(handlers::connection::matches))
}

fn chat_routes() -> Router<AppState> {
    Router::new().route("/{match_id}", get(handlers::chat::history))
}
