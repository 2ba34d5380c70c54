//! Typed payloads carried by inbound and outbound events.
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EntityId, GeoPoint, LocationSample, Timestamp};
use crate::domain::reconcile::{Eta, Priority};

// ============================================
// Lifecycle payloads (generated locally)
// ============================================

/// `connection_status`: the channel became usable or stopped being usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ConnectionStatus {
    pub fn connected() -> Self {
        Self {
            connected: true,
            reason: None,
        }
    }

    pub fn lost(reason: impl Into<String>) -> Self {
        Self {
            connected: false,
            reason: Some(reason.into()),
        }
    }
}

/// `connect_error`: one failed attempt, with the running attempt count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectErrorInfo {
    pub error: String,
    pub attempts: u32,
}

/// `reconnected`: a reconnect succeeded after `attempts` failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectedInfo {
    pub attempts: u32,
}

/// `reconnect_failed`: the reconnect budget ran out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectFailedInfo {
    pub max_attempts: u32,
}

// ============================================
// Backend → client payloads
// ============================================

/// `sos_response`: the backend acknowledged a citizen's report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosResponse {
    pub incident_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Minutes until help arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<u32>,
}

/// `new_alert` / `emergency_alert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub incident_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// `patient_incoming`: an ambulance is bringing a patient in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIncoming {
    pub patient_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambulance_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<Eta>,
}

// ============================================
// Client → backend payloads
// ============================================

/// `location_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub location: LocationSample,
    pub timestamp: Timestamp,
}

/// `join_room` / `leave_room`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub room_id: String,
}

/// `sos_report`: a citizen reports an emergency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosReport {
    pub location: GeoPoint,
    pub is_witness: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: Timestamp,
}

/// `sos_cancel` / `incident_accept`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRef {
    pub incident_id: EntityId,
}

impl IncidentRef {
    pub fn new(incident_id: impl Into<EntityId>) -> Self {
        Self {
            incident_id: incident_id.into(),
        }
    }
}

/// `incident_status_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStatusChange {
    pub incident_id: EntityId,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Responder duty status. Statuses the client has no name for travel as
/// `Other` with their label unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Availability {
    Available,
    Busy,
    OffDuty,
    Other(String),
}

impl From<String> for Availability {
    fn from(label: String) -> Self {
        match label.as_str() {
            "available" => Availability::Available,
            "busy" => Availability::Busy,
            "off_duty" => Availability::OffDuty,
            _ => Availability::Other(label),
        }
    }
}

impl From<Availability> for String {
    fn from(status: Availability) -> Self {
        match status {
            Availability::Available => "available".into(),
            Availability::Busy => "busy".into(),
            Availability::OffDuty => "off_duty".into(),
            Availability::Other(label) => label,
        }
    }
}

/// `responder_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityChange {
    pub status: Availability,
}

/// `patient_status_update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientStatusChange {
    pub patient_id: EntityId,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sos_report_uses_camel_case() {
        let report = SosReport {
            location: GeoPoint::new(1.0, 2.0),
            is_witness: true,
            description: None,
            timestamp: Timestamp::from_unix_millis(0),
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["isWitness"], json!(true));
        assert!(json.get("description").is_none());
    }

    #[test]
    fn reconnect_failed_names_max_attempts() {
        let json = serde_json::to_value(ReconnectFailedInfo { max_attempts: 5 }).unwrap();
        assert_eq!(json, json!({"maxAttempts": 5}));
    }

    #[test]
    fn alert_tolerates_sparse_payloads() {
        let alert: Alert = serde_json::from_value(json!({"incidentId": 3})).unwrap();
        assert_eq!(alert.incident_id, EntityId::Number(3));
        assert!(alert.priority.is_none());
    }

    #[test]
    fn availability_is_snake_case() {
        let json = serde_json::to_value(AvailabilityChange {
            status: Availability::OffDuty,
        })
        .unwrap();
        assert_eq!(json, json!({"status": "off_duty"}));
    }

    #[test]
    fn custom_availability_keeps_its_label() {
        let json = serde_json::to_value(AvailabilityChange {
            status: Availability::Other("on_break".into()),
        })
        .unwrap();
        assert_eq!(json, json!({"status": "on_break"}));

        let change: AvailabilityChange = serde_json::from_value(json!({"status": "busy"})).unwrap();
        assert_eq!(change.status, Availability::Busy);
    }
}
