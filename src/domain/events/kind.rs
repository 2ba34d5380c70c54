//! Names of every inbound event a subscriber can register for.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Closed set of inbound event kinds.
///
/// The first four are generated locally by the connection manager; the
/// rest arrive from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ConnectionStatus,
    ConnectError,
    Reconnected,
    ReconnectFailed,
    SosResponse,
    ResponderUpdate,
    IncidentUpdate,
    NewAlert,
    IncidentAssignment,
    AmbulanceUpdate,
    PatientIncoming,
    EmergencyAlert,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::ConnectionStatus,
        EventKind::ConnectError,
        EventKind::Reconnected,
        EventKind::ReconnectFailed,
        EventKind::SosResponse,
        EventKind::ResponderUpdate,
        EventKind::IncidentUpdate,
        EventKind::NewAlert,
        EventKind::IncidentAssignment,
        EventKind::AmbulanceUpdate,
        EventKind::PatientIncoming,
        EventKind::EmergencyAlert,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ConnectionStatus => "connection_status",
            EventKind::ConnectError => "connect_error",
            EventKind::Reconnected => "reconnected",
            EventKind::ReconnectFailed => "reconnect_failed",
            EventKind::SosResponse => "sos_response",
            EventKind::ResponderUpdate => "responder_update",
            EventKind::IncidentUpdate => "incident_update",
            EventKind::NewAlert => "new_alert",
            EventKind::IncidentAssignment => "incident_assignment",
            EventKind::AmbulanceUpdate => "ambulance_update",
            EventKind::PatientIncoming => "patient_incoming",
            EventKind::EmergencyAlert => "emergency_alert",
        }
    }

    /// Whether the connection manager produces this event itself.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            EventKind::ConnectionStatus
                | EventKind::ConnectError
                | EventKind::Reconnected
                | EventKind::ReconnectFailed
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::invalid_format("event", format!("unknown event '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!("sos_report".parse::<EventKind>().is_err());
    }

    #[test]
    fn lifecycle_kinds_are_the_local_ones() {
        let lifecycle: Vec<_> = EventKind::ALL.iter().filter(|k| k.is_lifecycle()).collect();
        assert_eq!(lifecycle.len(), 4);
        assert!(!EventKind::IncidentUpdate.is_lifecycle());
    }
}
