//! WebSocket layer: gateway (presence + rooms), connection handler, and the
//! closed event protocol.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod session;

pub use gateway::Gateway;
pub use handler::ws_handler;
