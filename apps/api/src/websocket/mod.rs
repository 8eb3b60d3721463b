//! WebSocket layer for live notification push
//!
//! Connections are authenticated with the same access tokens as the REST
//! API and tracked per user; delivery is strictly best-effort.

pub mod connection;
pub mod handler;
pub mod messages;

pub use connection::ConnectionRegistry;
pub use handler::ws_handler;
pub use messages::ServerMessage;
