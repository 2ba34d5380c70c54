//! Event adapters - in-process routing of inbound events.

mod router;

pub use router::{EventRouter, Subscription, Topic};
