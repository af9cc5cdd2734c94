//! Integration Tests Entry Point
//!
//! Tests are organized by module:
//! - `api/` - endpoint and wire-contract tests
//! - `common/` - shared test utilities

mod api;
mod common;
