//! WebSocket Session Record
//!
//! The identity bound to a connection at authentication time. The record is
//! immutable for the connection's lifetime; identity is never re-derived from
//! client-supplied fields after authentication.

use uuid::Uuid;

use crate::domain::UserSummary;

/// Immutable session record created when `authenticate` succeeds.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub user: UserSummary,
}

impl Session {
    pub fn new(session_id: String, user: UserSummary) -> Self {
        Self { session_id, user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}
