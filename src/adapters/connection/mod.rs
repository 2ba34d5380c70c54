//! Connection management - channel lifecycle, buffering and reconnects.
//!
//! - `ConnectionManager` - public handle: connect, send, disconnect, status
//! - `ChannelTask` - background loop owning the transport link and queue
//! - `ReconnectPolicy` / `ConnectionOptions` - retry budget and queue limits

mod manager;
mod policy;
mod task;

pub use manager::{ChannelStatus, ConnectionManager};
pub use policy::{ConnectionOptions, ReconnectPolicy};
