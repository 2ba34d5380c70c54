//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the realtime core to external systems:
//! - `events` - Event router fanning inbound events out to subscribers
//! - `queue` - Ordered buffer for outbound events while offline
//! - `connection` - Connection manager and its background task
//! - `transport` - WebSocket and in-memory connectors
//! - `credentials` - Static credential provider

pub mod connection;
pub mod credentials;
pub mod events;
pub mod queue;
pub mod transport;

pub use connection::{ChannelStatus, ConnectionManager, ConnectionOptions, ReconnectPolicy};
pub use credentials::StaticCredentials;
pub use events::{EventRouter, Subscription, Topic};
pub use queue::{FlushOutcome, MessageQueue, QueuePolicy, QueuedMessage};
pub use transport::{HandshakeRecord, InMemoryConnector, WebSocketConnector};
