//! RoleChannel - Behaviour shared by the citizen, responder and hospital channels.

use std::sync::Arc;

use tokio::sync::watch;

use crate::adapters::connection::{ChannelStatus, ConnectionManager, ConnectionOptions};
use crate::adapters::events::Subscription;
use crate::domain::connection::{ConnectionState, Credentials, Role};
use crate::domain::events::{
    ConnectErrorInfo, ConnectionStatus, EventKind, InboundEvent, LocationUpdate, OutboundEvent,
    ReconnectFailedInfo, ReconnectedInfo, RoomRef,
};
use crate::domain::foundation::{LocationSample, RealtimeError, Timestamp};
use crate::ports::{Connector, CredentialProvider, HandlerError};

/// Fallback arm of the typed `on_*` listeners. A payload that did not fit its
/// type is reported as a fault of the listener instead of being skipped.
pub(super) fn untyped(event: &InboundEvent) -> Result<(), HandlerError> {
    match event {
        InboundEvent::Malformed { reason, .. } => Err(reason.clone().into()),
        _ => Ok(()),
    }
}

/// A connection manager bound to one role's namespace.
///
/// Each role facade owns its own `RoleChannel`; nothing is shared between them.
#[derive(Clone, Debug)]
pub struct RoleChannel {
    role: Role,
    manager: ConnectionManager,
}

impl RoleChannel {
    pub fn new(role: Role, connector: Arc<dyn Connector>, options: ConnectionOptions) -> Self {
        Self {
            role,
            manager: ConnectionManager::with_options(role.namespace(), connector, options),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Opens the role namespace with `token`.
    pub async fn connect(&self, token: impl Into<String>) -> Result<(), RealtimeError> {
        self.manager
            .connect(Credentials::new(token, self.role))
            .await
    }

    /// Opens the role namespace with the provider's session.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` when the provider has no session, or a session for
    /// another role.
    pub async fn connect_with(&self, provider: &dyn CredentialProvider) -> Result<(), RealtimeError> {
        let credentials = provider
            .credentials()
            .ok_or(RealtimeError::Unauthenticated)?;
        if credentials.role != self.role {
            tracing::warn!(
                channel = %self.role,
                session_role = %credentials.role,
                "Session role does not match channel"
            );
            return Err(RealtimeError::Unauthenticated);
        }
        self.manager.connect(credentials).await
    }

    pub async fn reconnect(&self) -> Result<(), RealtimeError> {
        self.manager.reconnect().await
    }

    pub fn disconnect(&self) {
        self.manager.disconnect();
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.manager.watch_state()
    }

    pub fn status(&self) -> ChannelStatus {
        self.manager.status()
    }

    // ════════════════════════════════════════════════════════════════════════
    // Outbound
    // ════════════════════════════════════════════════════════════════════════

    pub fn send(&self, event: OutboundEvent) {
        self.manager.send(event);
    }

    pub fn join_room(&self, room_id: impl Into<String>) {
        self.send(OutboundEvent::JoinRoom(RoomRef {
            room_id: room_id.into(),
        }));
    }

    pub fn leave_room(&self, room_id: impl Into<String>) {
        self.send(OutboundEvent::LeaveRoom(RoomRef {
            room_id: room_id.into(),
        }));
    }

    pub fn update_location(&self, location: LocationSample) {
        self.send(OutboundEvent::LocationUpdate(LocationUpdate {
            location,
            timestamp: Timestamp::now(),
        }));
    }

    // ════════════════════════════════════════════════════════════════════════
    // Inbound
    // ════════════════════════════════════════════════════════════════════════

    pub fn subscribe<F>(&self, kind: EventKind, f: F) -> Subscription
    where
        F: Fn(&InboundEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.manager.router().subscribe(kind, f)
    }

    pub fn subscribe_all<F>(&self, f: F) -> Subscription
    where
        F: Fn(&InboundEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.manager.router().subscribe_all(f)
    }

    pub fn on_connection_status<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ConnectionStatus) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe(EventKind::ConnectionStatus, move |event| match event {
            InboundEvent::ConnectionStatus(status) => f(status),
            _ => Ok(()),
        })
    }

    pub fn on_connect_error<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ConnectErrorInfo) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe(EventKind::ConnectError, move |event| match event {
            InboundEvent::ConnectError(info) => f(info),
            _ => Ok(()),
        })
    }

    pub fn on_reconnected<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ReconnectedInfo) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe(EventKind::Reconnected, move |event| match event {
            InboundEvent::Reconnected(info) => f(info),
            _ => Ok(()),
        })
    }

    pub fn on_reconnect_failed<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ReconnectFailedInfo) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.subscribe(EventKind::ReconnectFailed, move |event| match event {
            InboundEvent::ReconnectFailed(info) => f(info),
            _ => Ok(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::credentials::StaticCredentials;
    use crate::adapters::transport::InMemoryConnector;
    use crate::domain::events::Frame;
    use serde_json::json;
    use std::sync::Mutex;

    fn channel(role: Role) -> (RoleChannel, InMemoryConnector) {
        let connector = InMemoryConnector::new();
        let channel = RoleChannel::new(
            role,
            Arc::new(connector.clone()),
            ConnectionOptions::default(),
        );
        (channel, connector)
    }

    #[tokio::test]
    async fn connect_opens_role_namespace() {
        let (channel, connector) = channel(Role::Hospital);

        channel.connect("tok").await.unwrap();

        assert!(channel.is_connected());
        let handshakes = connector.handshakes();
        assert_eq!(handshakes.len(), 1);
        assert_eq!(handshakes[0].namespace, "hospital");
        assert_eq!(handshakes[0].role, Role::Hospital);
    }

    #[tokio::test]
    async fn connect_with_rejects_session_of_another_role() {
        let (channel, connector) = channel(Role::Responder);
        let provider = StaticCredentials::new("tok", Role::Citizen);

        let result = channel.connect_with(&provider).await;

        assert!(matches!(result, Err(RealtimeError::Unauthenticated)));
        assert_eq!(connector.open_count(), 0);
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_with_anonymous_provider_is_unauthenticated() {
        let (channel, _connector) = channel(Role::Citizen);

        let result = channel.connect_with(&StaticCredentials::anonymous()).await;

        assert!(matches!(result, Err(RealtimeError::Unauthenticated)));
    }

    #[tokio::test]
    async fn room_membership_is_sent_in_order() {
        let (channel, connector) = channel(Role::Responder);
        channel.connect("tok").await.unwrap();

        channel.join_room("incident-7");
        channel.leave_room("incident-7");
        let sent = connector.wait_for_sent(2).await;

        assert_eq!(sent[0].event, "join_room");
        assert_eq!(sent[0].data, json!({"roomId": "incident-7"}));
        assert_eq!(sent[1].event, "leave_room");
    }

    #[tokio::test]
    async fn connection_status_listener_sees_connect() {
        let (channel, _connector) = channel(Role::Citizen);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        channel.on_connection_status(move |status| {
            sink.lock().unwrap().push(status.connected);
            Ok(())
        });

        channel.connect("tok").await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[tokio::test]
    async fn subscribe_all_receives_unrecognized_frames() {
        let (channel, connector) = channel(Role::Citizen);
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        channel.subscribe_all(move |event| {
            sink.lock().unwrap().push(event.name().to_string());
            Ok(())
        });
        channel.connect("tok").await.unwrap();

        connector.push_inbound(Frame::new("weather_notice", json!({"level": 2})));
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while !names.lock().unwrap().iter().any(|n| n == "weather_notice") {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
