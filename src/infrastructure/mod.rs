//! # Infrastructure Layer
//!
//! Concrete implementations of the domain repository traits (PostgreSQL via
//! sqlx) and of the external push-delivery collaborator.

pub mod database;
pub mod push;
pub mod repositories;
