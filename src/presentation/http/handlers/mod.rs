//! HTTP Handlers

pub mod chat;
pub mod connection;
pub mod health;
