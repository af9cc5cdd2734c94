//! Chat Service
//!
//! The message pipeline behind `sendMessage`: validation, rate limiting,
//! persistence and the notification hand-off. The WebSocket layer broadcasts
//! the accepted message to the room; history fetches serve the REST surface.
//!
//! Ordering within a match follows persist order: a message is only
//! broadcast after its insert succeeded.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::services::notification_service::{Notification, NotificationDispatcher};
use crate::application::services::rate_limiter::MessageRateLimiter;
use crate::domain::{ChatMessage, ConnectionRepository, Match, MessageRepository};
use crate::shared::error::AppError;

/// Maximum accepted message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Why a sendMessage call was rejected. Acked to the socket caller; the
/// `Unauthenticated` variant is produced by the socket layer before the
/// pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendRejection {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid room")]
    InvalidRoom,

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Message exceeds maximum length of {MAX_MESSAGE_LENGTH} characters")]
    ContentTooLong,

    #[error("Too many messages, please slow down")]
    RateLimited,

    #[error("Failed to send message")]
    PersistenceFailure,
}

/// An accepted message together with its broadcast/notification routing.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: ChatMessage,
    /// The other participant of the match, the notification recipient.
    pub recipient_id: Uuid,
}

/// Chat service trait
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Run the full sendMessage pipeline for an authenticated sender.
    async fn send_message(
        &self,
        sender_id: Uuid,
        sender_name: &str,
        match_id: Uuid,
        content: &str,
    ) -> Result<SentMessage, SendRejection>;

    /// Authorize and load a match for room membership checks.
    async fn authorize_room(&self, user_id: Uuid, match_id: Uuid) -> Result<Match, AppError>;

    /// Message history for a match, oldest first. The requester must be a
    /// participant.
    async fn history(
        &self,
        requester_id: Uuid,
        match_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError>;
}

/// ChatService implementation
pub struct ChatServiceImpl<M, C>
where
    M: MessageRepository,
    C: ConnectionRepository,
{
    messages: Arc<M>,
    connections: Arc<C>,
    rate_limiter: Arc<MessageRateLimiter>,
    notifier: NotificationDispatcher,
}

impl<M, C> ChatServiceImpl<M, C>
where
    M: MessageRepository,
    C: ConnectionRepository,
{
    pub fn new(
        messages: Arc<M>,
        connections: Arc<C>,
        rate_limiter: Arc<MessageRateLimiter>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            messages,
            connections,
            rate_limiter,
            notifier,
        }
    }
}

#[async_trait]
impl<M, C> ChatService for ChatServiceImpl<M, C>
where
    M: MessageRepository,
    C: ConnectionRepository,
{
    async fn send_message(
        &self,
        sender_id: Uuid,
        sender_name: &str,
        match_id: Uuid,
        content: &str,
    ) -> Result<SentMessage, SendRejection> {
        // Room must be a real match containing the sender.
        let match_record = self
            .connections
            .find_match_by_id(match_id)
            .await
            .map_err(|e| {
                tracing::error!(match_id = %match_id, error = %e, "Match lookup failed");
                SendRejection::InvalidRoom
            })?
            .ok_or(SendRejection::InvalidRoom)?;

        let recipient_id = match_record
            .counterpart(sender_id)
            .ok_or(SendRejection::InvalidRoom)?;

        let content = content.trim();
        if content.is_empty() {
            return Err(SendRejection::EmptyContent);
        }
        if content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(SendRejection::ContentTooLong);
        }

        if !self.rate_limiter.allow(sender_id) {
            tracing::warn!(
                sender = %sender_id,
                match_id = %match_id,
                "Message rate limit exceeded"
            );
            return Err(SendRejection::RateLimited);
        }

        let message = self
            .messages
            .insert(match_id, sender_id, content)
            .await
            .map_err(|e| {
                tracing::error!(
                    sender = %sender_id,
                    match_id = %match_id,
                    error = %e,
                    "Failed to persist chat message"
                );
                SendRejection::PersistenceFailure
            })?;

        // Detached: push fallback can never block or fail the send.
        self.notifier.notify(
            recipient_id,
            Notification::ChatMessage {
                match_id,
                sender_name: sender_name.to_string(),
                content: message.content.clone(),
            },
        );

        Ok(SentMessage {
            message,
            recipient_id,
        })
    }

    async fn authorize_room(&self, user_id: Uuid, match_id: Uuid) -> Result<Match, AppError> {
        let match_record = self
            .connections
            .find_match_by_id(match_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Match not found".into()))?;

        if !match_record.involves(user_id) {
            return Err(AppError::Forbidden(
                "Not a participant of this match".into(),
            ));
        }

        Ok(match_record)
    }

    async fn history(
        &self,
        requester_id: Uuid,
        match_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        self.authorize_room(requester_id, match_id).await?;
        self.messages.find_by_match(match_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    use crate::application::services::notification_service::{
        MockPresenceProvider, MockPushSender,
    };
    use crate::domain::entities::connection::MockConnectionRepository;
    use crate::domain::entities::message::MockMessageRepository;
    use crate::domain::entities::user::MockUserRepository;

    fn sender() -> Uuid {
        Uuid::from_u128(1)
    }

    fn recipient() -> Uuid {
        Uuid::from_u128(2)
    }

    fn match_id() -> Uuid {
        Uuid::from_u128(60)
    }

    fn match_record() -> Match {
        Match {
            id: match_id(),
            user_a: sender(),
            user_b: recipient(),
            event_id: Uuid::from_u128(100),
            created_at: Utc::now(),
        }
    }

    fn stored(content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::from_u128(70),
            match_id: match_id(),
            sender_id: sender(),
            content: content.to_string(),
            read_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn quiet_dispatcher() -> NotificationDispatcher {
        // Recipient online: chat pushes are skipped entirely.
        let mut presence = MockPresenceProvider::new();
        presence.expect_is_user_online().return_const(true);

        NotificationDispatcher::new(
            Arc::new(presence),
            Arc::new(MockUserRepository::new()),
            Arc::new(MockPushSender::new()),
        )
    }

    fn service(
        messages: MockMessageRepository,
        connections: MockConnectionRepository,
        limiter: MessageRateLimiter,
    ) -> ChatServiceImpl<MockMessageRepository, MockConnectionRepository> {
        ChatServiceImpl::new(
            Arc::new(messages),
            Arc::new(connections),
            Arc::new(limiter),
            quiet_dispatcher(),
        )
    }

    fn known_match(connections: &mut MockConnectionRepository) {
        connections
            .expect_find_match_by_id()
            .returning(|_| Ok(Some(match_record())));
    }

    fn default_limiter() -> MessageRateLimiter {
        MessageRateLimiter::new(Duration::from_secs(1), 5)
    }

    #[tokio::test]
    async fn accepted_message_routes_to_the_counterpart() {
        let mut connections = MockConnectionRepository::new();
        known_match(&mut connections);

        let mut messages = MockMessageRepository::new();
        messages
            .expect_insert()
            .times(1)
            .returning(|_, _, content| Ok(stored(content)));

        let svc = service(messages, connections, default_limiter());

        let sent = svc
            .send_message(sender(), "Ana", match_id(), "  hello  ")
            .await
            .unwrap();

        assert_eq!(sent.recipient_id, recipient());
        assert_eq!(sent.message.content, "hello");

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn unknown_match_is_an_invalid_room() {
        let mut connections = MockConnectionRepository::new();
        connections
            .expect_find_match_by_id()
            .returning(|_| Ok(None));

        let svc = service(
            MockMessageRepository::new(),
            connections,
            default_limiter(),
        );

        let err = svc
            .send_message(sender(), "Ana", match_id(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err, SendRejection::InvalidRoom);
    }

    #[tokio::test]
    async fn non_participant_sender_is_an_invalid_room() {
        let mut connections = MockConnectionRepository::new();
        known_match(&mut connections);

        let svc = service(
            MockMessageRepository::new(),
            connections,
            default_limiter(),
        );

        let outsider = Uuid::from_u128(99);
        let err = svc
            .send_message(outsider, "Eve", match_id(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err, SendRejection::InvalidRoom);
    }

    #[tokio::test]
    async fn empty_and_oversized_content_are_rejected() {
        let mut connections = MockConnectionRepository::new();
        known_match(&mut connections);

        let svc = service(
            MockMessageRepository::new(),
            connections,
            default_limiter(),
        );

        let err = svc
            .send_message(sender(), "Ana", match_id(), "   ")
            .await
            .unwrap_err();
        assert_eq!(err, SendRejection::EmptyContent);

        let long = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        let err = svc
            .send_message(sender(), "Ana", match_id(), &long)
            .await
            .unwrap_err();
        assert_eq!(err, SendRejection::ContentTooLong);
    }

    #[tokio::test]
    async fn sixth_message_in_a_window_is_rejected_and_not_persisted() {
        let mut connections = MockConnectionRepository::new();
        known_match(&mut connections);

        let mut messages = MockMessageRepository::new();
        // Exactly five inserts; the sixth never reaches the repository.
        messages
            .expect_insert()
            .times(5)
            .returning(|_, _, content| Ok(stored(content)));

        let svc = service(messages, connections, default_limiter());

        for _ in 0..5 {
            svc.send_message(sender(), "Ana", match_id(), "hello")
                .await
                .unwrap();
        }

        let err = svc
            .send_message(sender(), "Ana", match_id(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err, SendRejection::RateLimited);

        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn persistence_failure_is_reported_as_rejection() {
        let mut connections = MockConnectionRepository::new();
        known_match(&mut connections);

        let mut messages = MockMessageRepository::new();
        messages
            .expect_insert()
            .returning(|_, _, _| Err(AppError::Internal("connection lost".into())));

        let svc = service(messages, connections, default_limiter());

        let err = svc
            .send_message(sender(), "Ana", match_id(), "hello")
            .await
            .unwrap_err();
        assert_eq!(err, SendRejection::PersistenceFailure);
    }

    #[tokio::test]
    async fn history_requires_participation() {
        let mut connections = MockConnectionRepository::new();
        known_match(&mut connections);

        let svc = service(
            MockMessageRepository::new(),
            connections,
            default_limiter(),
        );

        let outsider = Uuid::from_u128(99);
        let err = svc.history(outsider, match_id(), 50).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn history_returns_messages_for_participants() {
        let mut connections = MockConnectionRepository::new();
        known_match(&mut connections);

        let mut messages = MockMessageRepository::new();
        messages
            .expect_find_by_match()
            .withf(|id, limit| *id == match_id() && *limit == 50)
            .returning(|_, _| Ok(vec![stored("hello"), stored("again")]));

        let svc = service(messages, connections, default_limiter());

        let history = svc.history(sender(), match_id(), 50).await.unwrap();
        assert_eq!(history.len(), 2);
    }
}
