//! Consumer-side cached entities and their partial updates.

use serde::{Deserialize, Serialize};

use super::Reconcile;
use crate::domain::foundation::{EntityId, GeoPoint, Timestamp};

/// Incident triage priority.
///
/// Decoding ignores case. Labels outside the known scale are kept as
/// `Other` so the rest of the payload still decodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
    Other(String),
}

impl Priority {
    pub fn as_str(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
            Priority::Other(label) => label,
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "medium" => Priority::Medium,
            "high" => Priority::High,
            "critical" => Priority::Critical,
            _ => Priority::Other(label),
        }
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        match priority {
            Priority::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// Arrival estimate: minutes from now, or an absolute arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Eta {
    Minutes(u32),
    At(Timestamp),
}

impl Eta {
    /// Absolute arrival time, resolving minutes against `now`.
    pub fn arrival(&self, now: Timestamp) -> Timestamp {
        match self {
            Eta::Minutes(minutes) => {
                let offset = chrono::Duration::minutes(i64::from(*minutes));
                Timestamp::from_datetime(*now.as_datetime() + offset)
            }
            Eta::At(at) => *at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub status: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Copies every `Some` field of the patch onto the entity.
macro_rules! overwrite {
    ($target:expr, $patch:expr, $($field:ident),+) => {
        $(
            if let Some(value) = &$patch.$field {
                $target.$field = Some(value.clone());
            }
        )+
    };
}

// ============================================
// Incident
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: EntityId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPatch {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// When present, replaces the whole timeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEntry>>,
}

impl Reconcile for Incident {
    type Id = EntityId;
    type Patch = IncidentPatch;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn patch_id(patch: &IncidentPatch) -> &EntityId {
        &patch.id
    }

    fn from_patch(patch: &IncidentPatch) -> Self {
        Self {
            id: patch.id.clone(),
            status: patch.status.clone(),
            location: patch.location,
            priority: patch.priority.clone(),
            timeline: patch.timeline.clone().unwrap_or_default(),
        }
    }

    fn apply(&mut self, patch: &IncidentPatch) {
        overwrite!(self, patch, status, location, priority);
        if let Some(timeline) = &patch.timeline {
            self.timeline = timeline.clone();
        }
    }
}

// ============================================
// Responder
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Responder {
    pub id: EntityId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Minutes to arrival.
    #[serde(default)]
    pub eta: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponderPatch {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<u32>,
}

impl Reconcile for Responder {
    type Id = EntityId;
    type Patch = ResponderPatch;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn patch_id(patch: &ResponderPatch) -> &EntityId {
        &patch.id
    }

    fn from_patch(patch: &ResponderPatch) -> Self {
        Self {
            id: patch.id.clone(),
            status: patch.status.clone(),
            location: patch.location,
            eta: patch.eta,
        }
    }

    fn apply(&mut self, patch: &ResponderPatch) {
        overwrite!(self, patch, status, location, eta);
    }
}

// ============================================
// Ambulance
// ============================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambulance {
    pub id: EntityId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub eta: Option<Eta>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmbulancePatch {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<Eta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl Reconcile for Ambulance {
    type Id = EntityId;
    type Patch = AmbulancePatch;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn patch_id(patch: &AmbulancePatch) -> &EntityId {
        &patch.id
    }

    fn from_patch(patch: &AmbulancePatch) -> Self {
        Self {
            id: patch.id.clone(),
            status: patch.status.clone(),
            eta: patch.eta,
            location: patch.location,
        }
    }

    fn apply(&mut self, patch: &AmbulancePatch) {
        overwrite!(self, patch, status, eta, location);
    }
}

// ============================================
// Bed pool
// ============================================

/// Bed capacity of one hospital department. Keyed by department name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedPool {
    pub department: String,
    pub available: u32,
    pub total: u32,
}

impl BedPool {
    pub fn occupied(&self) -> u32 {
        self.total.saturating_sub(self.available)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedPoolPatch {
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

impl Reconcile for BedPool {
    type Id = String;
    type Patch = BedPoolPatch;

    fn id(&self) -> &String {
        &self.department
    }

    fn patch_id(patch: &BedPoolPatch) -> &String {
        &patch.department
    }

    fn from_patch(patch: &BedPoolPatch) -> Self {
        let available = patch.available.unwrap_or(0);
        Self {
            department: patch.department.clone(),
            available,
            total: patch.total.unwrap_or(available),
        }
    }

    fn apply(&mut self, patch: &BedPoolPatch) {
        if let Some(available) = patch.available {
            self.available = available;
        }
        if let Some(total) = patch.total {
            self.total = total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reconcile::upsert;
    use serde_json::json;

    #[test]
    fn responder_patch_decodes_partial_json() {
        let patch: ResponderPatch =
            serde_json::from_value(json!({"id": "r-1", "eta": 4})).unwrap();
        assert_eq!(patch.id, EntityId::from("r-1"));
        assert_eq!(patch.eta, Some(4));
        assert!(patch.status.is_none());
    }

    #[test]
    fn ambulance_keeps_location_when_only_eta_changes() {
        let ambulance = Ambulance {
            id: EntityId::from(7u64),
            status: Some("transporting".into()),
            eta: Some(Eta::Minutes(12)),
            location: Some(GeoPoint::new(40.0, -74.0)),
        };
        let patch = AmbulancePatch {
            id: EntityId::from(7u64),
            eta: Some(Eta::Minutes(8)),
            ..AmbulancePatch::default()
        };

        let result = upsert(&[ambulance.clone()], &patch);

        assert_eq!(result[0].eta, Some(Eta::Minutes(8)));
        assert_eq!(result[0].location, ambulance.location);
        assert_eq!(result[0].status, ambulance.status);
    }

    #[test]
    fn timeline_is_replaced_wholesale() {
        let entry = |status: &str| TimelineEntry {
            status: status.into(),
            timestamp: Timestamp::from_unix_millis(0),
            note: None,
        };
        let incident = Incident {
            id: EntityId::from(1u64),
            timeline: vec![entry("reported")],
            ..Incident::default()
        };
        let patch = IncidentPatch {
            id: EntityId::from(1u64),
            timeline: Some(vec![entry("reported"), entry("dispatched")]),
            ..IncidentPatch::default()
        };

        let result = upsert(&[incident], &patch);
        assert_eq!(result[0].timeline.len(), 2);
    }

    #[test]
    fn bed_pools_merge_by_department() {
        let pools = vec![
            BedPool { department: "er".into(), available: 2, total: 10 },
            BedPool { department: "icu".into(), available: 1, total: 4 },
        ];
        let patch = BedPoolPatch {
            department: "icu".into(),
            available: Some(0),
            total: None,
        };

        let result = upsert(&pools, &patch);

        assert_eq!(result[1].available, 0);
        assert_eq!(result[1].total, 4);
        assert_eq!(result[1].occupied(), 4);
        assert_eq!(result[0], pools[0]);
    }

    #[test]
    fn priority_is_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_value(Priority::Critical).unwrap(), json!("critical"));
    }

    #[test]
    fn priority_decodes_any_case() {
        let priority: Priority = serde_json::from_value(json!("High")).unwrap();
        assert_eq!(priority, Priority::High);
        let priority: Priority = serde_json::from_value(json!("CRITICAL")).unwrap();
        assert_eq!(priority, Priority::Critical);
    }

    #[test]
    fn unknown_priority_label_is_kept() {
        let patch: IncidentPatch =
            serde_json::from_value(json!({"id": 5, "priority": "Urgent"})).unwrap();
        assert_eq!(patch.priority, Some(Priority::Other("Urgent".into())));
        assert_eq!(serde_json::to_value(&patch.priority).unwrap(), json!("Urgent"));
    }

    #[test]
    fn ambulance_eta_accepts_minutes_or_arrival_time() {
        let minutes: AmbulancePatch =
            serde_json::from_value(json!({"id": 3, "eta": 15})).unwrap();
        assert_eq!(minutes.eta, Some(Eta::Minutes(15)));

        let at: AmbulancePatch =
            serde_json::from_value(json!({"id": 3, "eta": "2026-10-19T12:30:00Z"})).unwrap();
        let expected = "2026-10-19T12:30:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap();
        assert_eq!(at.eta, Some(Eta::At(Timestamp::from_datetime(expected))));
    }

    #[test]
    fn eta_minutes_resolve_against_now() {
        let now = Timestamp::from_unix_millis(0);
        assert_eq!(Eta::Minutes(2).arrival(now), Timestamp::from_unix_millis(120_000));
        assert_eq!(Eta::At(now).arrival(Timestamp::from_unix_millis(5)), now);
    }
}
