//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the realtime core and the outside world. Adapters implement these ports.
//!
//! ## Transport Ports
//!
//! - `Connector` - Opens a handshaken link to a backend namespace
//! - `TransportLink` - One live bidirectional link
//!
//! ## Session Ports
//!
//! - `CredentialProvider` - Supplies token, role and authentication status
//!
//! ## Event Ports
//!
//! - `EventHandler` - Consumer invoked by the event router

mod credentials;
mod event_handler;
mod transport;

pub use credentials::CredentialProvider;
pub use event_handler::{CallbackFault, EventHandler, HandlerError};
pub use transport::{Connector, TransportLink};
