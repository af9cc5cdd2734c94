//! PostgreSQL repository implementations.

pub mod connection_repository;
pub mod event_repository;
pub mod message_repository;
pub mod user_repository;

pub use connection_repository::PgConnectionRepository;
pub use event_repository::PgEventRepository;
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
