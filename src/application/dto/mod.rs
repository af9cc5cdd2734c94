//! Data transfer objects for the REST surface.

pub mod request;
pub mod response;
