//! # Domain Layer
//!
//! The domain layer contains the core business logic of the match server.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (User, Event, ConnectionRequest, Match, ChatMessage)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Entities encapsulate domain behavior (e.g. canonical match ordering)

pub mod entities;

// Re-export commonly used types
pub use entities::*;
