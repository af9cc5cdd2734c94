//! # Match Server
//!
//! Backend for an event-based social app: mutual-match detection plus
//! real-time chat with presence and push-notification fallback.
//!
//! This is the application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use match_server::config::Settings;
use match_server::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    match_server::telemetry::init_tracing();

    info!("Starting Match Server...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
