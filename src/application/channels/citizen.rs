//! CitizenChannel - Emergency reporting for members of the public.

use std::ops::Deref;
use std::sync::Arc;

use super::role_channel::untyped;
use super::RoleChannel;
use crate::adapters::connection::ConnectionOptions;
use crate::adapters::events::Subscription;
use crate::domain::connection::Role;
use crate::domain::events::{EventKind, InboundEvent, IncidentRef, OutboundEvent, SosReport, SosResponse};
use crate::domain::foundation::{EntityId, GeoPoint, Timestamp};
use crate::domain::reconcile::{IncidentPatch, ResponderPatch};
use crate::ports::{Connector, HandlerError};

/// Channel on the `citizen` namespace.
#[derive(Clone, Debug)]
pub struct CitizenChannel {
    channel: RoleChannel,
}

impl CitizenChannel {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self::with_options(connector, ConnectionOptions::default())
    }

    pub fn with_options(connector: Arc<dyn Connector>, options: ConnectionOptions) -> Self {
        Self {
            channel: RoleChannel::new(Role::Citizen, connector, options),
        }
    }

    /// Reports an emergency at `location`. A witness report is one made on
    /// behalf of someone else.
    pub fn report_emergency(&self, location: GeoPoint, is_witness: bool, description: Option<String>) {
        tracing::info!(is_witness, "Reporting emergency");
        self.channel.send(OutboundEvent::SosReport(SosReport {
            location,
            is_witness,
            description,
            timestamp: Timestamp::now(),
        }));
    }

    pub fn cancel_emergency(&self, incident_id: impl Into<EntityId>) {
        self.channel
            .send(OutboundEvent::SosCancel(IncidentRef::new(incident_id)));
    }

    /// Dispatch acknowledgement for a report.
    pub fn on_sos_response<F>(&self, f: F) -> Subscription
    where
        F: Fn(&SosResponse) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel.subscribe(EventKind::SosResponse, move |event| match event {
            InboundEvent::SosResponse(response) => f(response),
            other => untyped(other),
        })
    }

    /// Position and ETA of the responder heading to the citizen.
    pub fn on_responder_update<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ResponderPatch) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.channel.subscribe(EventKind::ResponderUpdate, move |event| match event {
            InboundEvent::ResponderUpdate(patch) => f(patch),
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

impl Deref for CitizenChannel {
    type Target = RoleChannel;

    fn deref(&self) -> &RoleChannel {
        &self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::transport::InMemoryConnector;
    use crate::domain::events::Frame;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[tokio::test]
    async fn report_emergency_frame_shape() {
        let connector = InMemoryConnector::new();
        let citizen = CitizenChannel::new(Arc::new(connector.clone()));
        citizen.connect("tok").await.unwrap();

        citizen.report_emergency(GeoPoint::new(6.52, 3.37), true, Some("car crash".into()));
        let sent = connector.wait_for_sent(1).await;

        assert_eq!(sent[0].event, "sos_report");
        assert_eq!(sent[0].data["location"], json!({"latitude": 6.52, "longitude": 3.37}));
        assert_eq!(sent[0].data["isWitness"], json!(true));
        assert_eq!(sent[0].data["description"], json!("car crash"));
    }

    #[tokio::test]
    async fn cancel_emergency_carries_incident_id() {
        let connector = InMemoryConnector::new();
        let citizen = CitizenChannel::new(Arc::new(connector.clone()));
        citizen.connect("tok").await.unwrap();

        citizen.cancel_emergency("inc-9");
        let sent = connector.wait_for_sent(1).await;

        assert_eq!(sent[0].event, "sos_cancel");
        assert_eq!(sent[0].data, json!({"incidentId": "inc-9"}));
    }

    #[tokio::test]
    async fn sos_response_reaches_typed_listener() {
        let connector = InMemoryConnector::new();
        let citizen = CitizenChannel::new(Arc::new(connector.clone()));
        let etas = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&etas);
        citizen.on_sos_response(move |response| {
            sink.lock().unwrap().push(response.eta);
            Ok(())
        });
        citizen.connect("tok").await.unwrap();

        connector.push_inbound(Frame::new(
            "sos_response",
            json!({"incidentId": 3, "status": "dispatched", "eta": 240}),
        ));

        tokio::time::timeout(Duration::from_secs(1), async {
            while etas.lock().unwrap().is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert_eq!(*etas.lock().unwrap(), vec![Some(240)]);
    }
}
