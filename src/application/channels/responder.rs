//! ResponderChannel - Alerts, assignments and status for field responders.

use std::ops::Deref;
use std::sync::Arc;

use super::role_channel::untyped;
use super::RoleChannel;
use crate::adapters::connection::ConnectionOptions;
use crate::adapters::events::Subscription;
use crate::domain::connection::Role;
use crate::domain::events::{
    Alert, Availability, AvailabilityChange, EventKind, InboundEvent, IncidentRef,
    IncidentStatusChange, OutboundEvent,
};
use crate::domain::foundation::EntityId;
use crate::domain::reconcile::IncidentPatch;
use crate::ports::{Connector, HandlerError};

/// Channel on the `responder` namespace.
#[derive(Clone, Debug)]
pub struct ResponderChannel {
    channel: RoleChannel,
}

impl ResponderChannel {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_options(connector, ConnectionOptions::default())
    }

    pub fn with_options(connector: Arc<dyn Connector>, options: ConnectionOptions) -> Self {
        Self {
            channel: RoleChannel::new(Role::Responder, connector, options),
        }
    }

    pub fn accept_incident(&self, incident_id: impl Into<EntityId>) {
        self.channel
            .send(OutboundEvent::IncidentAccept(IncidentRef::new(incident_id)));
    }

    /// Moves an assigned incident along, e.g. to `en_route` or `on_scene`.
    pub fn update_incident_status(
        &self,
        incident_id: impl Into<EntityId>,
        status: impl Into<String>,
        notes: Option<String>,
    ) {
        self.channel
            .send(OutboundEvent::IncidentStatusUpdate(IncidentStatusChange {
                incident_id: incident_id.into(),
                status: status.into(),
                notes,
            }));
    }

    pub fn update_availability(&self, status: Availability) {
        self.channel
            .send(OutboundEvent::ResponderStatus(AvailabilityChange { status }));
    }

    pub fn on_new_alert<F>(&self, f: F) -> Subscription
    where
        F: Fn(&Alert) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel.subscribe(EventKind::NewAlert, move |event| match event {
            InboundEvent::NewAlert(alert) => f(alert),
            other => untyped(other),
        })
    }

    pub fn on_incident_assignment<F>(&self, f: F) -> Subscription
    where
        F: Fn(&IncidentPatch) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel
            .subscribe(EventKind::IncidentAssignment, move |event| match event {
                InboundEvent::IncidentAssignment(patch) => f(patch),
                other => untyped(other),
            })
    }

    pub fn on_incident_update<F>(&self, f: F) -> Subscription
    where
        F: Fn(&IncidentPatch) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel.subscribe(EventKind::IncidentUpdate, move |event| match event {
            InboundEvent::IncidentUpdate(patch) => f(patch),
            other => untyped(other),
        })
    }
}

impl Deref for ResponderChannel {
    type Target = RoleChannel;

    fn deref(&self) -> &RoleChannel {
        &self.channel
    }
}
