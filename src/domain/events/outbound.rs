//! Outbound events: everything a client can emit to the backend.

use serde::{Deserialize, Serialize};

use super::payloads::{
    AvailabilityChange, IncidentRef, IncidentStatusChange, LocationUpdate, PatientStatusChange,
    RoomRef, SosReport,
};
use super::Frame;
use crate::domain::foundation::RealtimeError;
use crate::domain::reconcile::BedPool;

/// A client-to-backend event. Serializes directly to its wire frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    LocationUpdate(LocationUpdate),
    JoinRoom(RoomRef),
    LeaveRoom(RoomRef),
    SosReport(SosReport),
    SosCancel(IncidentRef),
    IncidentAccept(IncidentRef),
    IncidentStatusUpdate(IncidentStatusChange),
    ResponderStatus(AvailabilityChange),
    BedAvailabilityUpdate(BedPool),
    PatientStatusUpdate(PatientStatusChange),
}

impl OutboundEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::LocationUpdate(_) => "location_update",
            OutboundEvent::JoinRoom(_) => "join_room",
            OutboundEvent::LeaveRoom(_) => "leave_room",
            OutboundEvent::SosReport(_) => "sos_report",
            OutboundEvent::SosCancel(_) => "sos_cancel",
            OutboundEvent::IncidentAccept(_) => "incident_accept",
            OutboundEvent::IncidentStatusUpdate(_) => "incident_status_update",
            OutboundEvent::ResponderStatus(_) => "responder_status",
            OutboundEvent::BedAvailabilityUpdate(_) => "bed_availability_update",
            OutboundEvent::PatientStatusUpdate(_) => "patient_status_update",
        }
    }

    pub fn to_frame(&self) -> Result<Frame, RealtimeError> {
        let value = serde_json::to_value(self)?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::EntityId;
    use serde_json::json;

    #[test]
    fn incident_accept_frame_shape() {
        let frame = OutboundEvent::IncidentAccept(IncidentRef::new(42u64))
            .to_frame()
            .unwrap();
        assert_eq!(frame.event, "incident_accept");
        assert_eq!(frame.data, json!({"incidentId": 42}));
    }

    #[test]
    fn frame_name_matches_declared_name() {
        let events = vec![
            OutboundEvent::JoinRoom(RoomRef {
                room_id: "incident-7".into(),
            }),
            OutboundEvent::SosCancel(IncidentRef::new("abc")),
            OutboundEvent::BedAvailabilityUpdate(BedPool {
                department: "er".into(),
                available: 3,
                total: 10,
            }),
            OutboundEvent::PatientStatusUpdate(PatientStatusChange {
                patient_id: EntityId::from(9u64),
                status: "admitted".into(),
            }),
        ];

        for event in events {
            assert_eq!(event.to_frame().unwrap().event, event.name());
        }
    }

    #[test]
    fn status_update_omits_missing_notes() {
        let frame = OutboundEvent::IncidentStatusUpdate(IncidentStatusChange {
            incident_id: EntityId::from(1u64),
            status: "resolved".into(),
            notes: None,
        })
        .to_frame()
        .unwrap();
        assert_eq!(frame.data, json!({"incidentId": 1, "status": "resolved"}));
    }
}
