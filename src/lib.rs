//! # Match Server Library
//!
//! This crate provides the backend core for an event-based social app:
//! - Mutual-match detection between attendees of the same event
//! - Real-time chat over WebSockets for matched pairs
//! - Presence tracking and push-notification fallback
//! - PostgreSQL for persistent storage
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database and push-delivery implementations
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! match_server/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities and repository traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database and push-delivery implementations
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Common utilities (errors)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
