//! Application layer - Role-facing channels and event consumers.
//!
//! This layer composes the connection manager, router and domain events
//! into the APIs client code uses directly.

pub mod channels;
pub mod event_log;

pub use channels::{CitizenChannel, HospitalChannel, ResponderChannel, RoleChannel};
pub use event_log::EventLog;
