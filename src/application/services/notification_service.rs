//! Notification Dispatcher
//!
//! Decides, per recipient and event, whether delivery happens over the live
//! transport or falls back to push, and owns push-token invalidation.
//!
//! Dispatch is fire-and-forget: `notify` spawns a detached task, so no failure
//! in the notification path can block or fail the chat/match operation that
//! triggered it. Persistence success remains the sole source of truth.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::UserRepository;
use crate::shared::error::AppError;

/// Maximum body length forwarded to the push collaborator.
const PUSH_BODY_MAX: usize = 100;

/// Presence lookup seam, implemented by the WebSocket gateway.
#[cfg_attr(test, mockall::automock)]
pub trait PresenceProvider: Send + Sync {
    /// Whether the user currently has at least one live transport connection.
    fn is_user_online(&self, user_id: Uuid) -> bool;
}

/// Outbound push payload handed to the external collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// Deep-link target: the match for chat/match events, the event for
    /// new-request notifications.
    pub link_id: Uuid,
}

/// Errors reported by the push collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The stored device token is invalid or no longer registered.
    #[error("device token invalid or unregistered")]
    InvalidToken,

    /// Any other delivery failure; logged and dropped.
    #[error("push delivery failed: {0}")]
    Delivery(String),
}

/// External push-delivery collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, device_token: &str, push: &PushMessage) -> Result<(), PushError>;
}

/// The events a recipient can be notified about.
#[derive(Debug, Clone)]
pub enum Notification {
    /// A chat message destined for a match room. Skipped entirely when the
    /// recipient is online, because the room broadcast already delivers it.
    ChatMessage {
        match_id: Uuid,
        sender_name: String,
        content: String,
    },
    /// A new incoming connection request. Out-of-band: there is no live
    /// subscriber guaranteed, so push is attempted regardless of presence.
    NewRequest {
        event_id: Uuid,
        sender_name: String,
        event_title: String,
    },
    /// A mutual match was established. Out-of-band, like `NewRequest`.
    NewMatch {
        match_id: Uuid,
        counterpart_name: String,
        event_title: String,
    },
}

impl Notification {
    fn is_chat_message(&self) -> bool {
        matches!(self, Notification::ChatMessage { .. })
    }

    fn to_push(&self) -> PushMessage {
        match self {
            Notification::ChatMessage {
                match_id,
                sender_name,
                content,
            } => PushMessage {
                title: format!("New message from {}", sender_name),
                body: truncate_body(content),
                link_id: *match_id,
            },
            Notification::NewRequest {
                event_id,
                sender_name,
                event_title,
            } => PushMessage {
                title: "New connection request".to_string(),
                body: format!(
                    "You have a new connection request from {} at {}!",
                    sender_name, event_title
                ),
                link_id: *event_id,
            },
            Notification::NewMatch {
                match_id,
                counterpart_name,
                event_title,
            } => PushMessage {
                title: "It's a match!".to_string(),
                body: format!(
                    "It's a match with {} at {}!",
                    counterpart_name, event_title
                ),
                link_id: *match_id,
            },
        }
    }
}

fn truncate_body(content: &str) -> String {
    if content.chars().count() > PUSH_BODY_MAX {
        let cut: String = content.chars().take(PUSH_BODY_MAX - 3).collect();
        format!("{}...", cut)
    } else {
        content.to_string()
    }
}

/// Routes notifications to the live transport or the push fallback.
#[derive(Clone)]
pub struct NotificationDispatcher {
    presence: Arc<dyn PresenceProvider>,
    users: Arc<dyn UserRepository>,
    push: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(
        presence: Arc<dyn PresenceProvider>,
        users: Arc<dyn UserRepository>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        Self {
            presence,
            users,
            push,
        }
    }

    /// Notify a recipient. Never fails the caller: delivery runs as a
    /// detached task and all outcomes are handled at the task boundary.
    pub fn notify(&self, recipient_id: Uuid, notification: Notification) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.deliver(recipient_id, &notification).await {
                tracing::warn!(
                    recipient = %recipient_id,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        });
    }

    /// Delivery policy, separated from the spawn for testability.
    pub(crate) async fn deliver(
        &self,
        recipient_id: Uuid,
        notification: &Notification,
    ) -> Result<(), AppError> {
        // Online recipients see chat messages through the room broadcast.
        if notification.is_chat_message() && self.presence.is_user_online(recipient_id) {
            tracing::debug!(recipient = %recipient_id, "Recipient online, skipping push");
            return Ok(());
        }

        let Some(target) = self.users.find_push_target(recipient_id).await? else {
            tracing::debug!(recipient = %recipient_id, "Recipient not found, dropping notification");
            return Ok(());
        };

        let Some(token) = target.device_token else {
            tracing::debug!(recipient = %recipient_id, "No device token, skipping push");
            return Ok(());
        };

        match self.push.send(&token, &notification.to_push()).await {
            Ok(()) => {
                tracing::info!(recipient = %recipient_id, "Push notification sent");
            }
            Err(PushError::InvalidToken) => {
                tracing::warn!(
                    recipient = %recipient_id,
                    "Invalid device token, clearing from user record"
                );
                // Token cleanup is bookkeeping; run it detached too.
                let users = Arc::clone(&self.users);
                tokio::spawn(async move {
                    if let Err(e) = users.clear_device_token(recipient_id).await {
                        tracing::error!(
                            recipient = %recipient_id,
                            error = %e,
                            "Failed to clear invalid device token"
                        );
                    }
                });
            }
            Err(PushError::Delivery(e)) => {
                tracing::warn!(recipient = %recipient_id, error = %e, "Push delivery failed, dropping");
            }
        }

        Ok(())
    }

    /// Persist a presence transition and timestamp it. Used by the gateway
    /// when a user's first connection opens or last connection closes.
    pub async fn record_presence(
        &self,
        user_id: Uuid,
        status: crate::domain::UserStatus,
    ) -> Result<chrono::DateTime<Utc>, AppError> {
        let now = Utc::now();
        self.users.update_status(user_id, status, now).await?;
        Ok(now)
    }
}
