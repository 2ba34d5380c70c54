//! HospitalChannel - Bed capacity and inbound patient tracking.

use std::ops::Deref;
use std::sync::Arc;

use super::role_channel::untyped;
use super::RoleChannel;
use crate::adapters::connection::ConnectionOptions;
use crate::adapters::events::Subscription;
use crate::domain::connection::Role;
use crate::domain::events::{
    Alert, EventKind, InboundEvent, OutboundEvent, PatientIncoming, PatientStatusChange,
};
use crate::domain::foundation::EntityId;
use crate::domain::reconcile::{AmbulancePatch, BedPool};
use crate::ports::{Connector, HandlerError};

/// Channel on the `hospital` namespace.
#[derive(Clone, Debug)]
pub struct HospitalChannel {
    channel: RoleChannel,
}

impl HospitalChannel {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_options(connector, ConnectionOptions::default())
    }

    pub fn with_options(connector: Arc<dyn Connector>, options: ConnectionOptions) -> Self {
        Self {
            channel: RoleChannel::new(Role::Hospital, connector, options),
        }
    }

    pub fn update_bed_availability(&self, beds: BedPool) {
        tracing::debug!(department = %beds.department, available = beds.available, "Publishing bed availability");
        self.channel.send(OutboundEvent::BedAvailabilityUpdate(beds));
    }

    pub fn update_patient_status(&self, patient_id: impl Into<EntityId>, status: impl Into<String>) {
        self.channel
            .send(OutboundEvent::PatientStatusUpdate(PatientStatusChange {
                patient_id: patient_id.into(),
                status: status.into(),
            }));
    }

    pub fn on_ambulance_update<F>(&self, f: F) -> Subscription
    where
        F: Fn(&AmbulancePatch) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel.subscribe(EventKind::AmbulanceUpdate, move |event| match event {
            InboundEvent::AmbulanceUpdate(patch) => f(patch),
            other => untyped(other),
        })
    }

    pub fn on_patient_incoming<F>(&self, f: F) -> Subscription
    where
        F: Fn(&PatientIncoming) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel.subscribe(EventKind::PatientIncoming, move |event| match event {
            InboundEvent::PatientIncoming(patient) => f(patient),
            other => untyped(other),
        })
    }

    pub fn on_emergency_alert<F>(&self, f: F) -> Subscription
    where
        F: Fn(&Alert) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel.subscribe(EventKind::EmergencyAlert, move |event| match event {
            InboundEvent::EmergencyAlert(alert) => f(alert),
            other => untyped(other),
        })
    }
}

impl Deref for HospitalChannel {
    type Target = RoleChannel;

    fn deref(&self) -> &RoleChannel {
        &self.channel
    }
}
