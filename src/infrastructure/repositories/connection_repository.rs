//! Connection Repository Implementation
//!
//! PostgreSQL implementation of connection request and match operations.
//! The accept-and-match step runs inside a single transaction; the unique
//! index on the canonical match key makes symmetric racing safe, with a
//! constraint conflict resolved by re-reading the winner's row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    ConnectionRepository, ConnectionRequest, Event, Match, MatchWithContext,
    PendingRequestWithSender, RequestStatus, UserSummary,
};
use crate::shared::error::AppError;

/// PostgreSQL connection repository implementation.
pub struct PgConnectionRepository {
    pool: PgPool,
}

impl PgConnectionRepository {
    /// Creates a new PgConnectionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    event_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl RequestRow {
    fn into_request(self) -> ConnectionRequest {
        ConnectionRequest {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            event_id: self.event_id,
            status: RequestStatus::from_str(&self.status),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MatchRow {
    id: Uuid,
    user_a: Uuid,
    user_b: Uuid,
    event_id: Uuid,
    created_at: DateTime<Utc>,
}

impl MatchRow {
    fn into_match(self) -> Match {
        Match {
            id: self.id,
            user_a: self.user_a,
            user_b: self.user_b,
            event_id: self.event_id,
            created_at: self.created_at,
        }
    }
}

/// Pending request joined with the sender's display fields.
#[derive(Debug, sqlx::FromRow)]
struct PendingWithSenderRow {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    event_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    sender_name: String,
    sender_photo_url: String,
}

impl PendingWithSenderRow {
    fn into_view(self) -> PendingRequestWithSender {
        PendingRequestWithSender {
            sender: UserSummary {
                id: self.sender_id,
                name: self.sender_name,
                photo_url: self.sender_photo_url,
            },
            request: ConnectionRequest {
                id: self.id,
                sender_id: self.sender_id,
                receiver_id: self.receiver_id,
                event_id: self.event_id,
                status: RequestStatus::from_str(&self.status),
                created_at: self.created_at,
            },
        }
    }
}

/// Match joined with counterparty summary and event context.
#[derive(Debug, sqlx::FromRow)]
struct MatchWithContextRow {
    id: Uuid,
    user_a: Uuid,
    user_b: Uuid,
    event_id: Uuid,
    created_at: DateTime<Utc>,
    counterpart_id: Uuid,
    counterpart_name: String,
    counterpart_photo_url: String,
    event_title: String,
    event_location: Option<String>,
    event_starts_at: DateTime<Utc>,
}

impl MatchWithContextRow {
    fn into_view(self) -> MatchWithContext {
        MatchWithContext {
            match_record: Match {
                id: self.id,
                user_a: self.user_a,
                user_b: self.user_b,
                event_id: self.event_id,
                created_at: self.created_at,
            },
            counterpart: UserSummary {
                id: self.counterpart_id,
                name: self.counterpart_name,
                photo_url: self.counterpart_photo_url,
            },
            event: Event {
                id: self.event_id,
                title: self.event_title,
                location: self.event_location,
                starts_at: self.event_starts_at,
            },
        }
    }
}

#[async_trait]
impl ConnectionRepository for PgConnectionRepository {
    async fn find_pending(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<ConnectionRequest>, AppError> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT id, sender_id, receiver_id, event_id, status, created_at
            FROM connection_requests
            WHERE sender_id = $1 AND receiver_id = $2 AND event_id = $3
              AND status = 'pending'
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_request()))
    }

    async fn create_pending(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        event_id: Uuid,
    ) -> Result<ConnectionRequest, AppError> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            INSERT INTO connection_requests (id, sender_id, receiver_id, event_id, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id, sender_id, receiver_id, event_id, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_request())
    }

    async fn accept_and_create_match(
        &self,
        request_id: Uuid,
        user_a: Uuid,
        user_b: Uuid,
        event_id: Uuid,
    ) -> Result<Match, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE connection_requests
            SET status = 'accepted'
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(request_id)
        .execute(&mut *tx)
        .await?;

        // Conditional insert on the canonical key. When the symmetric racer
        // already inserted, DO NOTHING returns no row and the existing match
        // is the result.
        let inserted = sqlx::query_as::<_, MatchRow>(
            r#"
            INSERT INTO matches (id, user_a, user_b, event_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_a, user_b, event_id) DO NOTHING
            RETURNING id, user_a, user_b, event_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_a)
        .bind(user_b)
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match inserted {
            Some(row) => row,
            None => {
                sqlx::query_as::<_, MatchRow>(
                    r#"
                    SELECT id, user_a, user_b, event_id, created_at
                    FROM matches
                    WHERE user_a = $1 AND user_b = $2 AND event_id = $3
                    "#,
                )
                .bind(user_a)
                .bind(user_b)
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;

        Ok(row.into_match())
    }

    async fn find_match(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Match>, AppError> {
        let row = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, user_a, user_b, event_id, created_at
            FROM matches
            WHERE user_a = $1 AND user_b = $2 AND event_id = $3
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_match()))
    }

    async fn find_match_by_id(&self, id: Uuid) -> Result<Option<Match>, AppError> {
        let row = sqlx::query_as::<_, MatchRow>(
            r#"
            SELECT id, user_a, user_b, event_id, created_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_match()))
    }

    async fn pending_for_receiver(
        &self,
        receiver_id: Uuid,
    ) -> Result<Vec<PendingRequestWithSender>, AppError> {
        let rows = sqlx::query_as::<_, PendingWithSenderRow>(
            r#"
            SELECT r.id, r.sender_id, r.receiver_id, r.event_id, r.status, r.created_at,
                   u.name AS sender_name, u.photo_url AS sender_photo_url
            FROM connection_requests r
            JOIN users u ON u.id = r.sender_id
            WHERE r.receiver_id = $1 AND r.status = 'pending'
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(receiver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_view()).collect())
    }

    async fn matches_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<MatchWithContext>, AppError> {
        let rows = sqlx::query_as::<_, MatchWithContextRow>(
            r#"
            SELECT m.id, m.user_a, m.user_b, m.event_id, m.created_at,
                   u.id AS counterpart_id,
                   u.name AS counterpart_name,
                   u.photo_url AS counterpart_photo_url,
                   e.title AS event_title,
                   e.location AS event_location,
                   e.starts_at AS event_starts_at
            FROM matches m
            JOIN users u
              ON u.id = CASE WHEN m.user_a = $1 THEN m.user_b ELSE m.user_a END
            JOIN events e ON e.id = m.event_id
            WHERE m.user_a = $1 OR m.user_b = $1
            ORDER BY m.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_view()).collect())
    }
}
