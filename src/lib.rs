//! GuardianNet Realtime - Real-time sync client for emergency response
//!
//! Keeps citizen, responder and hospital clients connected to the GuardianNet
//! backend: one authenticated channel per role, ordered delivery of outbound
//! events across reconnects, typed inbound event fan-out, and pure helpers
//! for folding partial entity updates into local state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
