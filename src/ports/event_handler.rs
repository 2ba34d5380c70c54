//! EventHandler port - Interface for consuming dispatched events.
//!
//! Handlers are invoked synchronously by the event router on the connection
//! task. They should return quickly; long work belongs on a spawned task.

use std::error::Error;

use crate::domain::events::InboundEvent;
use crate::domain::foundation::RealtimeError;

/// Error type handlers may return. Reported as a callback fault.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Consumer of inbound events.
///
/// # Example
///
/// ```ignore
/// struct IncidentCache { incidents: Mutex<Vec<Incident>> }
///
/// impl EventHandler for IncidentCache {
///     fn handle(&self, event: &InboundEvent) -> Result<(), HandlerError> {
///         if let InboundEvent::IncidentUpdate(patch) = event {
///             let mut incidents = self.incidents.lock()?;
///             *incidents = upsert(&incidents, patch);
///         }
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "IncidentCache"
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Process one event.
    ///
    /// Errors and panics are isolated: they are logged, reported to fault
    /// listeners, and never stop delivery to the remaining handlers.
    fn handle(&self, event: &InboundEvent) -> Result<(), HandlerError>;

    /// Handler name for logs and fault reports.
    fn name(&self) -> &str;
}

/// A handler that failed during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFault {
    pub handler: String,
    pub event: String,
    pub message: String,
}

impl std::fmt::Display for CallbackFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "handler '{}' failed on '{}': {}",
            self.handler, self.event, self.message
        )
    }
}

impl From<CallbackFault> for RealtimeError {
    fn from(fault: CallbackFault) -> Self {
        RealtimeError::CallbackFault {
            handler: fault.handler,
            event: fault.event,
            message: fault.message,
        }
    }
}
