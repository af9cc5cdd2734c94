//! Connection request and match entities with their repository trait.
//!
//! A `ConnectionRequest` is one-directional; when two users request each other
//! for the same event the reciprocal request is accepted and a `Match` is
//! created. The match stores its user pair in canonical order so that the
//! unique index on `(user_a, user_b, event_id)` holds regardless of which
//! side initiated.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::Event;
use super::user::UserSummary;
use crate::shared::error::AppError;

/// Connection request status matching the `status` column constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// A one-directional connection request.
///
/// Maps to the `connection_requests` table:
/// - id: UUID PRIMARY KEY
/// - sender_id, receiver_id, event_id: UUID NOT NULL
/// - status: VARCHAR(10) DEFAULT 'pending'
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// At most one pending request exists per (sender, receiver, event); a
/// partial unique index enforces this. Requests are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub event_id: Uuid,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A mutual match between two users at an event.
///
/// Maps to the `matches` table:
/// - id: UUID PRIMARY KEY
/// - user_a, user_b, event_id: UUID NOT NULL, UNIQUE(user_a, user_b, event_id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// `user_a < user_b` always holds (canonical ordering). Matches are created
/// exactly once and are immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Order a user pair canonically: smaller UUID first.
    ///
    /// This is the single ordering authority for match keys; every insert and
    /// lookup goes through it so the unique index covers the unordered pair.
    pub fn canonical_pair(x: Uuid, y: Uuid) -> (Uuid, Uuid) {
        if x <= y {
            (x, y)
        } else {
            (y, x)
        }
    }

    /// Whether the given user is one of the two participants.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }

    /// The other participant, or `None` if the user is not part of the match.
    pub fn counterpart(&self, user_id: Uuid) -> Option<Uuid> {
        if self.user_a == user_id {
            Some(self.user_b)
        } else if self.user_b == user_id {
            Some(self.user_a)
        } else {
            None
        }
    }
}

/// A pending request joined with its sender's display summary.
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequestWithSender {
    pub request: ConnectionRequest,
    pub sender: UserSummary,
}

/// A match joined with the counterparty's summary and the event context.
#[derive(Debug, Clone, Serialize)]
pub struct MatchWithContext {
    pub match_record: Match,
    pub counterpart: UserSummary,
    pub event: Event,
}

/// Data access contract for connection requests and matches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Find a pending request sender -> receiver for the given event.
    async fn find_pending(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<ConnectionRequest>, AppError>;

    /// Create a new pending request.
    async fn create_pending(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        event_id: Uuid,
    ) -> Result<ConnectionRequest, AppError>;

    /// Accept the reciprocal request and insert the match in one transaction.
    ///
    /// The `(user_a, user_b)` pair must already be in canonical order. A
    /// unique-constraint violation on the match insert means the symmetric
    /// racer won; implementations return the existing match in that case
    /// instead of surfacing an error.
    async fn accept_and_create_match(
        &self,
        request_id: Uuid,
        user_a: Uuid,
        user_b: Uuid,
        event_id: Uuid,
    ) -> Result<Match, AppError>;

    /// Find a match by its canonically-ordered pair and event.
    async fn find_match(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Match>, AppError>;

    /// Find a match by its ID.
    async fn find_match_by_id(&self, id: Uuid) -> Result<Option<Match>, AppError>;

    /// Pending requests addressed to the given user, newest first.
    async fn pending_for_receiver(
        &self,
        receiver_id: Uuid,
    ) -> Result<Vec<PendingRequestWithSender>, AppError>;

    /// All matches involving the given user, with counterparty and event joined.
    async fn matches_for_user(&self, user_id: Uuid)
        -> Result<Vec<MatchWithContext>, AppError>;
}
