//! Event Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Event, EventRepository};
use crate::shared::error::AppError;

/// PostgreSQL event repository implementation.
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new PgEventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    location: Option<String>,
    starts_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self) -> Event {
        Event {
            id: self.id,
            title: self.title,
            location: self.location,
            starts_at: self.starts_at,
        }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, title, location, starts_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_event()))
    }
}
