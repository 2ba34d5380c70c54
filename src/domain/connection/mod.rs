//! Connection domain - channel identity and its lifecycle state machine.

mod channel;
mod state;

pub use channel::{Channel, Credentials, Handshake, Role};
pub use state::ConnectionState;
