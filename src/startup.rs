//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::services::{
    MessageRateLimiter, NotificationDispatcher, PushSender,
};
use crate::config::Settings;
use crate::infrastructure::database;
use crate::infrastructure::push::{HttpPushSender, NoopPushSender};
use crate::infrastructure::repositories::PgUserRepository;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::Gateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub gateway: Arc<Gateway>,
    pub rate_limiter: Arc<MessageRateLimiter>,
    pub dispatcher: NotificationDispatcher,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        // WebSocket gateway doubles as the presence source
        let gateway = Arc::new(Gateway::new());

        let rate_limiter = Arc::new(MessageRateLimiter::new(
            Duration::from_millis(settings.chat.rate_limit.window_ms),
            settings.chat.rate_limit.max_messages,
        ));

        let push: Arc<dyn PushSender> = if settings.push.enabled {
            Arc::new(HttpPushSender::new(&settings.push))
        } else {
            Arc::new(NoopPushSender)
        };

        let dispatcher = NotificationDispatcher::new(
            gateway.clone(),
            Arc::new(PgUserRepository::new(db.clone())),
            push,
        );

        // Create app state
        let state = AppState {
            db,
            gateway,
            rate_limiter,
            dispatcher,
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(logging::create_trace_layer())
            .layer(cors::create_cors_layer(&settings.cors));

        // Bind to address
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
