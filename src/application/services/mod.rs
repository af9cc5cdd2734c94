//! Application services.

pub mod chat_service;
pub mod connection_service;
pub mod notification_service;
pub mod rate_limiter;

pub use chat_service::{ChatService, ChatServiceImpl, SendRejection, SentMessage};
pub use connection_service::{
    ConnectionError, ConnectionOutcome, ConnectionService, ConnectionServiceImpl,
};
pub use notification_service::{
    Notification, NotificationDispatcher, PresenceProvider, PushError, PushMessage, PushSender,
};
pub use rate_limiter::MessageRateLimiter;
