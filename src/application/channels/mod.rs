//! Role channels - One typed facade per client role.
//!
//! Each facade owns an independent connection manager on its role's
//! namespace and exposes only the events that role may send:
//!
//! - `CitizenChannel` - emergency reports and cancellations
//! - `ResponderChannel` - incident acceptance, progress and availability
//! - `HospitalChannel` - bed capacity and patient status
//!
//! Common operations (connect, rooms, location, lifecycle listeners) live on
//! `RoleChannel`, reachable through `Deref`.
//!
//! # Example
//!
//! ```ignore
//! let responder = ResponderChannel::new(Arc::new(WebSocketConnector::new(url, timeout)));
//! responder.on_new_alert(|alert| {
//!     println!("new incident {}", alert.incident_id);
//!     Ok(())
//! });
//! responder.connect(token).await?;
//! responder.accept_incident(42u64);
//! ```

mod citizen;
mod hospital;
mod responder;
mod role_channel;

pub use citizen::CitizenChannel;
pub use hospital::HospitalChannel;
pub use responder::ResponderChannel;
pub use role_channel::RoleChannel;
