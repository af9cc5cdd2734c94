//! Message Repository Implementation
//!
//! PostgreSQL implementation of chat message storage. Messages are append-only
//! and served oldest-first per match via the `(match_id, created_at)` index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{ChatMessage, MessageRepository};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    match_id: Uuid,
    sender_id: Uuid,
    content: String,
    read_by: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            match_id: self.match_id,
            sender_id: self.sender_id,
            content: self.content,
            read_by: self.read_by,
            created_at: self.created_at,
        }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(
        &self,
        match_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, match_id, sender_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, match_id, sender_id, content, read_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(match_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    async fn find_by_match(
        &self,
        match_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, match_id, sender_id, content, read_by, created_at
            FROM messages
            WHERE match_id = $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(match_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }
}
