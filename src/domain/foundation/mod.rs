//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the real-time client.

mod errors;
mod geo;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, RealtimeError, ValidationError};
pub use geo::{GeoPoint, LocationSample};
pub use ids::{EntityId, HandlerId, MessageId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
