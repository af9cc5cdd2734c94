//! Event entity and repository trait.
//!
//! Events are owned by the external event subsystem. The matching core only
//! verifies that an event exists and reads its title for notification copy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// An event at which attendees can request connections.
///
/// Maps to the `events` table:
/// - id: UUID PRIMARY KEY
/// - title: TEXT NOT NULL
/// - location: TEXT NULL
/// - starts_at: TIMESTAMPTZ NOT NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
}

/// Data access contract for events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Fetch an event by its ID. Returns `None` if it does not exist.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, AppError>;
}
