//! # Application Layer
//!
//! Business logic services and data transfer objects. Services depend only on
//! the domain repository traits, so every external collaborator (persistence,
//! push delivery, presence) can be substituted in tests.

pub mod dto;
pub mod services;
