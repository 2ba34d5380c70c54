//! Inbound events: everything a subscriber can receive.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::payloads::{
    Alert, ConnectErrorInfo, ConnectionStatus, PatientIncoming, ReconnectFailedInfo,
    ReconnectedInfo, SosResponse,
};
use super::{EventKind, Frame};
use crate::domain::foundation::{RealtimeError, Timestamp};
use crate::domain::reconcile::{AmbulancePatch, IncidentPatch, ResponderPatch};

/// An event delivered to subscribers, with a strongly typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ConnectionStatus(ConnectionStatus),
    ConnectError(ConnectErrorInfo),
    Reconnected(ReconnectedInfo),
    ReconnectFailed(ReconnectFailedInfo),
    SosResponse(SosResponse),
    ResponderUpdate(ResponderPatch),
    IncidentUpdate(IncidentPatch),
    NewAlert(Alert),
    IncidentAssignment(IncidentPatch),
    AmbulanceUpdate(AmbulancePatch),
    PatientIncoming(PatientIncoming),
    EmergencyAlert(Alert),
    /// A known event whose payload did not fit its type. Still delivered to
    /// the subscribers of `kind`, with the raw frame.
    Malformed {
        kind: EventKind,
        frame: Frame,
        reason: String,
    },
    /// A frame with an unknown name. Only wildcard subscribers see these.
    Unrecognized(Frame),
}

fn payload<T: DeserializeOwned>(frame: &Frame) -> Result<T, RealtimeError> {
    serde_json::from_value(frame.data.clone()).map_err(|e| {
        RealtimeError::Codec(format!("invalid '{}' payload: {}", frame.event, e))
    })
}

fn typed<T: DeserializeOwned>(
    kind: EventKind,
    frame: &Frame,
    wrap: fn(T) -> InboundEvent,
) -> InboundEvent {
    match payload(frame) {
        Ok(value) => wrap(value),
        Err(e) => InboundEvent::Malformed {
            kind,
            frame: frame.clone(),
            reason: e.to_string(),
        },
    }
}

fn to_json<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

impl InboundEvent {
    /// Decodes a transport frame.
    ///
    /// Unknown event names decode to [`InboundEvent::Unrecognized`]; a known
    /// name with a payload that does not fit decodes to
    /// [`InboundEvent::Malformed`].
    pub fn decode(frame: &Frame) -> Self {
        let Ok(kind) = frame.event.parse::<EventKind>() else {
            return InboundEvent::Unrecognized(frame.clone());
        };
        match kind {
            EventKind::ConnectionStatus => typed(kind, frame, InboundEvent::ConnectionStatus),
            EventKind::ConnectError => typed(kind, frame, InboundEvent::ConnectError),
            EventKind::Reconnected => typed(kind, frame, InboundEvent::Reconnected),
            EventKind::ReconnectFailed => typed(kind, frame, InboundEvent::ReconnectFailed),
            EventKind::SosResponse => typed(kind, frame, InboundEvent::SosResponse),
            EventKind::ResponderUpdate => typed(kind, frame, InboundEvent::ResponderUpdate),
            EventKind::IncidentUpdate => typed(kind, frame, InboundEvent::IncidentUpdate),
            EventKind::NewAlert => typed(kind, frame, InboundEvent::NewAlert),
            EventKind::IncidentAssignment => typed(kind, frame, InboundEvent::IncidentAssignment),
            EventKind::AmbulanceUpdate => typed(kind, frame, InboundEvent::AmbulanceUpdate),
            EventKind::PatientIncoming => typed(kind, frame, InboundEvent::PatientIncoming),
            EventKind::EmergencyAlert => typed(kind, frame, InboundEvent::EmergencyAlert),
        }
    }

    /// The subscription kind, or `None` for unrecognized frames.
    pub fn kind(&self) -> Option<EventKind> {
        Some(match self {
            InboundEvent::ConnectionStatus(_) => EventKind::ConnectionStatus,
            InboundEvent::ConnectError(_) => EventKind::ConnectError,
            InboundEvent::Reconnected(_) => EventKind::Reconnected,
            InboundEvent::ReconnectFailed(_) => EventKind::ReconnectFailed,
            InboundEvent::SosResponse(_) => EventKind::SosResponse,
            InboundEvent::ResponderUpdate(_) => EventKind::ResponderUpdate,
            InboundEvent::IncidentUpdate(_) => EventKind::IncidentUpdate,
            InboundEvent::NewAlert(_) => EventKind::NewAlert,
            InboundEvent::IncidentAssignment(_) => EventKind::IncidentAssignment,
            InboundEvent::AmbulanceUpdate(_) => EventKind::AmbulanceUpdate,
            InboundEvent::PatientIncoming(_) => EventKind::PatientIncoming,
            InboundEvent::EmergencyAlert(_) => EventKind::EmergencyAlert,
            InboundEvent::Malformed { kind, .. } => *kind,
            InboundEvent::Unrecognized(_) => return None,
        })
    }

    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            InboundEvent::Unrecognized(frame) | InboundEvent::Malformed { frame, .. } => &frame.event,
            other => other.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    /// The payload rendered back to JSON, for diagnostics and logs.
    pub fn payload_json(&self) -> Value {
        match self {
            InboundEvent::ConnectionStatus(p) => to_json(p),
            InboundEvent::ConnectError(p) => to_json(p),
            InboundEvent::Reconnected(p) => to_json(p),
            InboundEvent::ReconnectFailed(p) => to_json(p),
            InboundEvent::SosResponse(p) => to_json(p),
            InboundEvent::ResponderUpdate(p) => to_json(p),
            InboundEvent::IncidentUpdate(p) | InboundEvent::IncidentAssignment(p) => to_json(p),
            InboundEvent::NewAlert(p) | InboundEvent::EmergencyAlert(p) => to_json(p),
            InboundEvent::AmbulanceUpdate(p) => to_json(p),
            InboundEvent::PatientIncoming(p) => to_json(p),
            InboundEvent::Unrecognized(frame) | InboundEvent::Malformed { frame, .. } => {
                frame.data.clone()
            }
        }
    }
}

/// A received event as retained by consumers: name, raw payload, arrival time.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingEvent {
    pub name: String,
    pub payload: Value,
    pub received_at: Timestamp,
}

impl From<&InboundEvent> for IncomingEvent {
    fn from(event: &InboundEvent) -> Self {
        Self {
            name: event.name().to_string(),
            payload: event.payload_json(),
            received_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::EntityId;
    use serde_json::json;

    #[test]
    fn decodes_incident_update() {
        let frame = Frame::new("incident_update", json!({"id": 5, "status": "on_scene"}));
        let event = InboundEvent::decode(&frame);

        match &event {
            InboundEvent::IncidentUpdate(patch) => {
                assert_eq!(patch.id, EntityId::Number(5));
                assert_eq!(patch.status.as_deref(), Some("on_scene"));
            }
            other => panic!("expected incident update, got {:?}", other),
        }
        assert_eq!(event.kind(), Some(EventKind::IncidentUpdate));
        assert_eq!(event.name(), "incident_update");
    }

    #[test]
    fn unknown_names_are_unrecognized_not_errors() {
        let frame = Frame::new("weather_report", json!({"rain": true}));
        let event = InboundEvent::decode(&frame);

        assert_eq!(event.kind(), None);
        assert_eq!(event.name(), "weather_report");
        assert_eq!(event.payload_json(), json!({"rain": true}));
    }

    #[test]
    fn malformed_known_payload_keeps_its_kind() {
        let frame = Frame::new("ambulance_update", json!({"id": 3, "eta": [1, 2]}));
        let event = InboundEvent::decode(&frame);

        match &event {
            InboundEvent::Malformed { kind, reason, .. } => {
                assert_eq!(*kind, EventKind::AmbulanceUpdate);
                assert!(reason.contains("ambulance_update"));
            }
            other => panic!("expected malformed event, got {:?}", other),
        }
        assert_eq!(event.kind(), Some(EventKind::AmbulanceUpdate));
        assert_eq!(event.name(), "ambulance_update");
        assert_eq!(event.payload_json(), json!({"id": 3, "eta": [1, 2]}));
    }

    #[test]
    fn loosely_typed_backend_payloads_decode() {
        let ambulance = Frame::new("ambulance_update", json!({"id": 3, "eta": "2026-10-19T12:30:00Z"}));
        assert!(matches!(InboundEvent::decode(&ambulance), InboundEvent::AmbulanceUpdate(_)));

        let incident = Frame::new("incident_update", json!({"id": 5, "priority": "High"}));
        match InboundEvent::decode(&incident) {
            InboundEvent::IncidentUpdate(patch) => {
                assert_eq!(patch.priority, Some(crate::domain::reconcile::Priority::High))
            }
            other => panic!("expected incident update, got {:?}", other),
        }

        let extra = Frame::new(
            "incident_update",
            json!({"id": 6, "status": "on_scene", "patientCount": 2}),
        );
        assert!(matches!(InboundEvent::decode(&extra), InboundEvent::IncidentUpdate(_)));
    }

    #[test]
    fn payload_json_mirrors_wire_shape() {
        let event = InboundEvent::ReconnectFailed(ReconnectFailedInfo { max_attempts: 5 });
        assert_eq!(event.payload_json(), json!({"maxAttempts": 5}));
    }

    #[test]
    fn incoming_event_captures_name_and_payload() {
        let event = InboundEvent::ConnectionStatus(ConnectionStatus::connected());
        let incoming = IncomingEvent::from(&event);
        assert_eq!(incoming.name, "connection_status");
        assert_eq!(incoming.payload, json!({"connected": true}));
    }
}
