//! WebSocket transport layer
//!
//! Connection URI building, transport errors, and the socket abstraction
//! the feed's connection manager is written against.

mod transport;
mod types;

pub use transport::{Connection, Transport, WsTransport};
pub use types::{WsConfig, WsError, FINNHUB_WS_URL};
