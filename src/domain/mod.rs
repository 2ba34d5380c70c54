//! Domain layer containing the realtime types and pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, geo points, errors, state machine)
//! - `connection` - Channel identity, credentials and the connection state machine
//! - `events` - Wire frames, event names and typed inbound/outbound payloads
//! - `reconcile` - Pure merge of partial updates into cached entity lists

pub mod connection;
pub mod events;
pub mod foundation;
pub mod reconcile;
