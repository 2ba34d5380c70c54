//! Transport ports - Interface to the bidirectional link with the backend.
//!
//! The connection manager never touches sockets directly. It asks a
//! [`Connector`] for a link per connection attempt and drives that link from
//! its background task.
//!
//! ## Contract
//!
//! - `open` performs the transport connect and the handshake; it returns only
//!   once the backend accepted or refused the credentials.
//! - A refused handshake is `RealtimeError::AuthRejected`; any other failure
//!   is `RealtimeError::Transport`.
//! - Only one link per channel is alive at any time; the manager drops the
//!   previous link before opening a new one.

use async_trait::async_trait;

use crate::domain::connection::Handshake;
use crate::domain::events::Frame;
use crate::domain::foundation::RealtimeError;

/// Opens handshaken links to a backend namespace.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to `namespace` and presents the handshake.
    async fn open(
        &self,
        namespace: &str,
        handshake: &Handshake,
    ) -> Result<Box<dyn TransportLink>, RealtimeError>;
}

/// A live, handshaken link.
#[async_trait]
pub trait TransportLink: Send {
    /// Writes one frame.
    async fn send(&mut self, frame: &Frame) -> Result<(), RealtimeError>;

    /// Waits for the next inbound frame.
    ///
    /// Returns `None` once the link is closed. Must be cancel-safe: it is
    /// polled inside `tokio::select!` and dropping the future loses nothing.
    async fn recv(&mut self) -> Option<Result<Frame, RealtimeError>>;

    /// Closes the link. Errors are ignored.
    async fn close(&mut self);
}
