//! User projections and repository trait.
//!
//! The user record is owned by the external profile subsystem; this core only
//! reads the fields it needs (display data for chat, push token and presence
//! status for notification routing) and writes presence transitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// User presence status matching the `status` column constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Offline,
    Online,
}

impl UserStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "online" => Self::Online,
            _ => Self::Offline,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Online => "online",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display projection of a user, as embedded in chat payloads,
/// pending-request listings and match listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub photo_url: String,
}

/// Notification-routing projection of a user.
#[derive(Debug, Clone)]
pub struct PushTarget {
    pub id: Uuid,
    pub status: UserStatus,
    /// Device token for the push collaborator; absent when the user has
    /// no registered device or the token was invalidated.
    pub device_token: Option<String>,
}

/// Data access contract for the externally-owned user record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch the display summary for a user.
    async fn find_summary(&self, id: Uuid) -> Result<Option<UserSummary>, AppError>;

    /// Fetch the notification-routing projection for a user.
    async fn find_push_target(&self, id: Uuid) -> Result<Option<PushTarget>, AppError>;

    /// Persist a presence transition together with the last-online timestamp.
    async fn update_status(
        &self,
        id: Uuid,
        status: UserStatus,
        last_online: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Remove an invalidated device token from the user record.
    async fn clear_device_token(&self, id: Uuid) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        assert_eq!(UserStatus::from_str("online"), UserStatus::Online);
        assert_eq!(UserStatus::from_str("OFFLINE"), UserStatus::Offline);
        // Unknown values degrade to offline
        assert_eq!(UserStatus::from_str("away"), UserStatus::Offline);
        assert_eq!(UserStatus::Online.as_str(), "online");
    }
}
