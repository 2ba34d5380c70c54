//! Transport adapters - implementations of the `Connector` port.
//!
//! - `WebSocketConnector` - production transport over tokio-tungstenite
//! - `InMemoryConnector` - scriptable backend for tests and demos

mod in_memory;
mod websocket;

pub use in_memory::{HandshakeRecord, InMemoryConnector};
pub use websocket::{WebSocketConnector, WebSocketLink};
