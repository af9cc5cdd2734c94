//! Chat message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A chat message within a match room.
///
/// Maps to the `messages` table:
/// - id: UUID PRIMARY KEY
/// - match_id: UUID NOT NULL REFERENCES matches(id)
/// - sender_id: UUID NOT NULL
/// - content: TEXT NOT NULL
/// - read_by: UUID[] NOT NULL DEFAULT '{}'
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Messages are append-only and ordered by `created_at` ascending within a
/// match (index on `(match_id, created_at)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    /// Read receipts: users that have seen this message.
    pub read_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Data access contract for chat messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Append a message to a match's history.
    async fn insert(
        &self,
        match_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, AppError>;

    /// Fetch up to `limit` messages for a match, oldest first.
    async fn find_by_match(
        &self,
        match_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError>;
}
