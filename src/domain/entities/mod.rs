//! Domain entities and repository traits.

pub mod connection;
pub mod event;
pub mod message;
pub mod user;

pub use connection::{
    ConnectionRepository, ConnectionRequest, Match, MatchWithContext, PendingRequestWithSender,
    RequestStatus,
};
pub use event::{Event, EventRepository};
pub use message::{ChatMessage, MessageRepository};
pub use user::{PushTarget, UserRepository, UserStatus, UserSummary};
