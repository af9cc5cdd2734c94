//! Connection Service
//!
//! Turns one-way connection requests into mutual matches. The check-then-act
//! window between "look up the reciprocal request" and "create the match" is
//! closed at the persistence boundary: the match insert is conditional on the
//! unique canonical key, and a constraint violation is treated as "already
//! matched", never surfaced to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::services::notification_service::{Notification, NotificationDispatcher};
use crate::domain::{
    ConnectionRepository, ConnectionRequest, EventRepository, Match, MatchWithContext,
    PendingRequestWithSender, UserRepository,
};
use crate::shared::error::AppError;

/// Result of a connection request: either a pending request was created, or
/// the reciprocal request existed and a match was established.
#[derive(Debug, Clone)]
pub enum ConnectionOutcome {
    Request(ConnectionRequest),
    Match(Match),
}

/// Connection service errors.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Cannot send a connection request to yourself")]
    SelfConnection,

    #[error("Event not found")]
    EventNotFound,

    #[error("Connection request already sent")]
    DuplicateRequest,

    #[error("Users are already matched for this event")]
    AlreadyMatched,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for ConnectionError {
    fn from(e: AppError) -> Self {
        ConnectionError::Internal(e.to_string())
    }
}

/// Connection service trait
#[async_trait]
pub trait ConnectionService: Send + Sync {
    /// Send a connection request from `sender_id` to `receiver_id` at an event.
    async fn request_connection(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        event_id: Uuid,
    ) -> Result<ConnectionOutcome, ConnectionError>;

    /// Pending requests addressed to the user, newest first.
    async fn pending_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PendingRequestWithSender>, AppError>;

    /// All matches for the user with counterparty and event context.
    async fn matches_for_user(&self, user_id: Uuid) -> Result<Vec<MatchWithContext>, AppError>;
}

/// ConnectionService implementation
pub struct ConnectionServiceImpl<C, E, U>
where
    C: ConnectionRepository,
    E: EventRepository,
    U: UserRepository,
{
    connections: Arc<C>,
    events: Arc<E>,
    users: Arc<U>,
    notifier: NotificationDispatcher,
}

impl<C, E, U> ConnectionServiceImpl<C, E, U>
where
    C: ConnectionRepository,
    E: EventRepository,
    U: UserRepository,
{
    pub fn new(
        connections: Arc<C>,
        events: Arc<E>,
        users: Arc<U>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            connections,
            events,
            users,
            notifier,
        }
    }

    async fn display_name(&self, user_id: Uuid) -> String {
        match self.users.find_summary(user_id).await {
            Ok(Some(summary)) => summary.name,
            _ => "Someone".to_string(),
        }
    }
}

#[async_trait]
impl<C, E, U> ConnectionService for ConnectionServiceImpl<C, E, U>
where
    C: ConnectionRepository,
    E: EventRepository,
    U: UserRepository,
{
    async fn request_connection(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        event_id: Uuid,
    ) -> Result<ConnectionOutcome, ConnectionError> {
        if sender_id == receiver_id {
            return Err(ConnectionError::SelfConnection);
        }

        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(ConnectionError::EventNotFound)?;

        // A re-request after the match exists must not create anything.
        let (user_a, user_b) = Match::canonical_pair(sender_id, receiver_id);
        if self
            .connections
            .find_match(user_a, user_b, event_id)
            .await?
            .is_some()
        {
            return Err(ConnectionError::AlreadyMatched);
        }

        if self
            .connections
            .find_pending(sender_id, receiver_id, event_id)
            .await?
            .is_some()
        {
            return Err(ConnectionError::DuplicateRequest);
        }

        // Reciprocal pending request = mutual interest; accept it and create
        // the match atomically.
        if let Some(reciprocal) = self
            .connections
            .find_pending(receiver_id, sender_id, event_id)
            .await?
        {
            let match_record = self
                .connections
                .accept_and_create_match(reciprocal.id, user_a, user_b, event_id)
                .await?;

            tracing::info!(
                match_id = %match_record.id,
                event_id = %event_id,
                "Mutual match established"
            );

            let sender_name = self.display_name(sender_id).await;
            let receiver_name = self.display_name(receiver_id).await;

            // Both sides hear about the match; each payload names the other
            // participant.
            self.notifier.notify(
                sender_id,
                Notification::NewMatch {
                    match_id: match_record.id,
                    counterpart_name: receiver_name,
                    event_title: event.title.clone(),
                },
            );
            self.notifier.notify(
                receiver_id,
                Notification::NewMatch {
                    match_id: match_record.id,
                    counterpart_name: sender_name,
                    event_title: event.title,
                },
            );

            return Ok(ConnectionOutcome::Match(match_record));
        }

        let request = self
            .connections
            .create_pending(sender_id, receiver_id, event_id)
            .await?;

        tracing::info!(
            request_id = %request.id,
            event_id = %event_id,
            "Connection request created"
        );

        let sender_name = self.display_name(sender_id).await;
        self.notifier.notify(
            receiver_id,
            Notification::NewRequest {
                event_id,
                sender_name,
                event_title: event.title,
            },
        );

        Ok(ConnectionOutcome::Request(request))
    }

    async fn pending_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PendingRequestWithSender>, AppError> {
        self.connections.pending_for_receiver(user_id).await
    }

    async fn matches_for_user(&self, user_id: Uuid) -> Result<Vec<MatchWithContext>, AppError> {
        self.connections.matches_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::application::services::notification_service::{
        MockPresenceProvider, MockPushSender,
    };
    use crate::domain::entities::connection::MockConnectionRepository;
    use crate::domain::entities::event::MockEventRepository;
    use crate::domain::entities::user::MockUserRepository;
    use crate::domain::{Event, RequestStatus, UserSummary};

    fn user_a() -> Uuid {
        Uuid::from_u128(1)
    }

    fn user_b() -> Uuid {
        Uuid::from_u128(2)
    }

    fn event_id() -> Uuid {
        Uuid::from_u128(100)
    }

    fn event() -> Event {
        Event {
            id: event_id(),
            title: "Rust Meetup".into(),
            location: Some("Berlin".into()),
            starts_at: Utc::now(),
        }
    }

    fn pending(sender: Uuid, receiver: Uuid) -> ConnectionRequest {
        ConnectionRequest {
            id: Uuid::from_u128(50),
            sender_id: sender,
            receiver_id: receiver,
            event_id: event_id(),
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    fn match_record() -> Match {
        Match {
            id: Uuid::from_u128(60),
            user_a: user_a(),
            user_b: user_b(),
            event_id: event_id(),
            created_at: Utc::now(),
        }
    }

    fn summary(id: Uuid, name: &str) -> UserSummary {
        UserSummary {
            id,
            name: name.into(),
            photo_url: String::new(),
        }
    }

    fn dispatcher_expecting_pushes(count: usize) -> NotificationDispatcher {
        // Offline recipients with tokens: every notify attempts one push.
        let mut presence = MockPresenceProvider::new();
        presence.expect_is_user_online().return_const(false);

        let mut users = MockUserRepository::new();
        users.expect_find_push_target().returning(|id| {
            Ok(Some(crate::domain::PushTarget {
                id,
                status: crate::domain::UserStatus::Offline,
                device_token: Some("tok".into()),
            }))
        });

        let mut push = MockPushSender::new();
        push.expect_send().times(count).returning(|_, _| Ok(()));

        NotificationDispatcher::new(Arc::new(presence), Arc::new(users), Arc::new(push))
    }

    fn quiet_dispatcher() -> NotificationDispatcher {
        let mut presence = MockPresenceProvider::new();
        presence.expect_is_user_online().return_const(true);

        let mut users = MockUserRepository::new();
        users.expect_find_push_target().returning(|_| Ok(None));

        NotificationDispatcher::new(
            Arc::new(presence),
            Arc::new(users),
            Arc::new(MockPushSender::new()),
        )
    }

    fn service(
        connections: MockConnectionRepository,
        events: MockEventRepository,
        users: MockUserRepository,
        notifier: NotificationDispatcher,
    ) -> ConnectionServiceImpl<MockConnectionRepository, MockEventRepository, MockUserRepository>
    {
        ConnectionServiceImpl::new(
            Arc::new(connections),
            Arc::new(events),
            Arc::new(users),
            notifier,
        )
    }

    #[tokio::test]
    async fn self_connection_is_rejected_without_side_effects() {
        let svc = service(
            MockConnectionRepository::new(),
            MockEventRepository::new(),
            MockUserRepository::new(),
            quiet_dispatcher(),
        );

        let err = svc
            .request_connection(user_a(), user_a(), event_id())
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::SelfConnection));
    }

    #[tokio::test]
    async fn unknown_event_is_rejected() {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(|_| Ok(None));

        let svc = service(
            MockConnectionRepository::new(),
            events,
            MockUserRepository::new(),
            quiet_dispatcher(),
        );

        let err = svc
            .request_connection(user_a(), user_b(), event_id())
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::EventNotFound));
    }

    #[tokio::test]
    async fn duplicate_pending_request_is_rejected() {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(|_| Ok(Some(event())));

        let mut connections = MockConnectionRepository::new();
        connections.expect_find_match().returning(|_, _, _| Ok(None));
        connections
            .expect_find_pending()
            .withf(|s, r, _| *s == Uuid::from_u128(1) && *r == Uuid::from_u128(2))
            .returning(|s, r, _| Ok(Some(pending(s, r))));

        let svc = service(
            connections,
            events,
            MockUserRepository::new(),
            quiet_dispatcher(),
        );

        let err = svc
            .request_connection(user_a(), user_b(), event_id())
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::DuplicateRequest));
    }

    #[tokio::test]
    async fn re_request_after_match_cannot_create_a_duplicate() {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(|_| Ok(Some(event())));

        let mut connections = MockConnectionRepository::new();
        // Canonical pair is always queried smaller-id first
        connections
            .expect_find_match()
            .withf(|a, b, _| *a == Uuid::from_u128(1) && *b == Uuid::from_u128(2))
            .returning(|_, _, _| Ok(Some(match_record())));

        let svc = service(
            connections,
            events,
            MockUserRepository::new(),
            quiet_dispatcher(),
        );

        // Either side re-requesting gets the same conflict
        let err = svc
            .request_connection(user_b(), user_a(), event_id())
            .await
            .unwrap_err();

        assert!(matches!(err, ConnectionError::AlreadyMatched));
    }

    #[tokio::test]
    async fn first_request_creates_pending_and_notifies_receiver() {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(|_| Ok(Some(event())));

        let mut connections = MockConnectionRepository::new();
        connections.expect_find_match().returning(|_, _, _| Ok(None));
        connections
            .expect_find_pending()
            .returning(|_, _, _| Ok(None));
        connections
            .expect_create_pending()
            .times(1)
            .returning(|s, r, _| Ok(pending(s, r)));

        let mut users = MockUserRepository::new();
        users
            .expect_find_summary()
            .returning(|id| Ok(Some(summary(id, "Ana"))));

        let svc = service(connections, events, users, dispatcher_expecting_pushes(1));

        let outcome = svc
            .request_connection(user_a(), user_b(), event_id())
            .await
            .unwrap();

        let ConnectionOutcome::Request(request) = outcome else {
            panic!("expected a pending request");
        };
        assert_eq!(request.sender_id, user_a());
        assert_eq!(request.receiver_id, user_b());
        assert_eq!(request.status, RequestStatus::Pending);

        // Give the detached notification task time to satisfy mock expectations.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn reciprocal_request_produces_a_canonical_match() {
        let mut events = MockEventRepository::new();
        events.expect_find_by_id().returning(|_| Ok(Some(event())));

        let mut connections = MockConnectionRepository::new();
        connections.expect_find_match().returning(|_, _, _| Ok(None));
        // No pending B->A, but a reciprocal A->B exists; B is now requesting A.
        connections
            .expect_find_pending()
            .withf(|s, _, _| *s == Uuid::from_u128(2))
            .returning(|_, _, _| Ok(None));
        connections
            .expect_find_pending()
            .withf(|s, _, _| *s == Uuid::from_u128(1))
            .returning(|s, r, _| Ok(Some(pending(s, r))));
        connections
            .expect_accept_and_create_match()
            .withf(|_, a, b, _| *a == Uuid::from_u128(1) && *b == Uuid::from_u128(2))
            .times(1)
            .returning(|_, _, _, _| Ok(match_record()));

        let mut users = MockUserRepository::new();
        users
            .expect_find_summary()
            .returning(|id| Ok(Some(summary(id, "Ana"))));

        // Both participants are notified
        let svc = service(connections, events, users, dispatcher_expecting_pushes(2));

        let outcome = svc
            .request_connection(user_b(), user_a(), event_id())
            .await
            .unwrap();

        let ConnectionOutcome::Match(m) = outcome else {
            panic!("expected a match");
        };
        assert!(m.user_a < m.user_b);

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
