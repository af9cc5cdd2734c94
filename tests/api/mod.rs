//! API Tests

mod health_tests;
mod socket_protocol_tests;
