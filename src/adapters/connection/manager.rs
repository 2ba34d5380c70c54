//! Connection manager - the public handle to one channel.
//!
//! Owns the channel state, the event router and the ordered command stream
//! feeding the background [`ChannelTask`](super::task::ChannelTask).
//!
//! # Example
//!
//! ```ignore
//! let manager = ConnectionManager::new("responder", Arc::new(connector));
//! manager.router().subscribe(EventKind::NewAlert, |event| { ... });
//!
//! manager.connect(Credentials::new(token, Role::Responder)).await?;
//! manager.send(OutboundEvent::IncidentAccept(IncidentRef::new(42u64)));
//! manager.disconnect();
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use super::policy::ConnectionOptions;
use super::task::{ChannelTask, Command};
use crate::adapters::events::EventRouter;
use crate::adapters::queue::{MessageQueue, QueuePolicy, QueuedMessage};
use crate::domain::connection::{Channel, ConnectionState, Credentials, Role};
use crate::domain::events::OutboundEvent;
use crate::domain::foundation::RealtimeError;
use crate::ports::{Connector, CredentialProvider};

/// Snapshot of a channel for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    pub namespace: String,
    pub state: ConnectionState,
    pub reconnect_attempts: u32,
    /// Outbound messages accepted by `send` and not yet written.
    pub queued: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Sending half of the command stream plus the count of unwritten messages.
///
/// Until a task takes the receiver on connect, sends go to `parked`, where
/// the queue policy already applies. Replaced on disconnect, which discards
/// anything still in flight.
pub(super) struct Outbox {
    tx: mpsc::UnboundedSender<Command>,
    rx: Option<mpsc::UnboundedReceiver<Command>>,
    parked: MessageQueue,
    backlog: Arc<AtomicUsize>,
}

impl Outbox {
    fn new(policy: QueuePolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Some(rx),
            parked: MessageQueue::new(policy),
            backlog: Arc::new(AtomicUsize::new(0)),
        }
    }
}

/// State shared between the manager and its task.
pub(super) struct Shared {
    pub channel: Channel,
    /// Bumped on disconnect; a task from an older generation may no longer
    /// touch the channel.
    pub generation: u64,
    pub outbox: Outbox,
    pub cancel: Option<CancellationToken>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    router: EventRouter,
    options: ConnectionOptions,
    shared: Arc<Mutex<Shared>>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(cancel) = self.lock().cancel.take() {
            cancel.cancel();
        }
    }
}

/// Handle to one channel. Cheap to clone; the background task is stopped
/// when the last clone is dropped.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(namespace: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self::with_options(namespace, connector, ConnectionOptions::default())
    }

    pub fn with_options(
        namespace: impl Into<String>,
        connector: Arc<dyn Connector>,
        options: ConnectionOptions,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                connector,
                router: EventRouter::new(),
                options,
                shared: Arc::new(Mutex::new(Shared {
                    channel: Channel::new(namespace),
                    generation: 0,
                    outbox: Outbox::new(options.queue),
                    cancel: None,
                })),
                state_tx: Arc::new(state_tx),
            }),
        }
    }

    pub fn namespace(&self) -> String {
        self.inner.lock().channel.namespace().to_string()
    }

    pub fn router(&self) -> &EventRouter {
        &self.inner.router
    }

    pub fn options(&self) -> ConnectionOptions {
        self.inner.options
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().channel.state()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn status(&self) -> ChannelStatus {
        let shared = self.inner.lock();
        ChannelStatus {
            namespace: shared.channel.namespace().to_string(),
            state: shared.channel.state(),
            reconnect_attempts: shared.channel.reconnect_attempts(),
            queued: shared.outbox.backlog.load(Ordering::SeqCst),
            role: shared.channel.role(),
        }
    }

    /// Opens the channel and waits for the first handshake outcome.
    ///
    /// Allowed from `Disconnected` and `Failed`. On a failed handshake the
    /// error is returned and the channel keeps retrying in the background.
    ///
    /// # Errors
    ///
    /// - `AlreadyActive` if the channel is connecting, connected or reconnecting
    /// - `Transport` / `AuthRejected` if the first attempt failed
    /// - `Disconnected` if the channel was torn down while waiting
    pub async fn connect(&self, credentials: Credentials) -> Result<(), RealtimeError> {
        let (ready_tx, ready_rx) = oneshot::channel();

        {
            let mut shared = self.inner.lock();
            let state = shared.channel.state();
            let handshake = credentials.handshake();

            match state {
                ConnectionState::Disconnected => {
                    if shared.outbox.rx.is_none() {
                        return Err(RealtimeError::AlreadyActive { state });
                    }
                    shared
                        .channel
                        .begin(credentials)
                        .map_err(|_| RealtimeError::AlreadyActive { state })?;
                    let Some(commands) = shared.outbox.rx.take() else {
                        return Err(RealtimeError::Disconnected);
                    };

                    let cancel = CancellationToken::new();
                    shared.cancel = Some(cancel.clone());
                    self.inner.state_tx.send_replace(ConnectionState::Connecting);

                    let task = ChannelTask {
                        namespace: shared.channel.namespace().to_string(),
                        handshake,
                        connector: Arc::clone(&self.inner.connector),
                        router: self.inner.router.clone(),
                        policy: self.inner.options.reconnect,
                        queue: std::mem::replace(
                            &mut shared.outbox.parked,
                            MessageQueue::new(self.inner.options.queue),
                        ),
                        commands,
                        ready: Some(ready_tx),
                        shared: Arc::clone(&self.inner.shared),
                        state_tx: Arc::clone(&self.inner.state_tx),
                        backlog: Arc::clone(&shared.outbox.backlog),
                        generation: shared.generation,
                        cancel,
                    };
                    tracing::info!(namespace = %task.namespace, role = %task.handshake.role, "Connecting channel");
                    tokio::spawn(task.run());
                }
                ConnectionState::Failed => {
                    shared
                        .channel
                        .begin(credentials)
                        .map_err(|_| RealtimeError::AlreadyActive { state })?;
                    self.inner.state_tx.send_replace(ConnectionState::Connecting);
                    shared
                        .outbox
                        .tx
                        .send(Command::Reconnect {
                            handshake,
                            ready: ready_tx,
                        })
                        .map_err(|_| RealtimeError::Disconnected)?;
                }
                active => return Err(RealtimeError::AlreadyActive { state: active }),
            }
        }

        ready_rx.await.unwrap_or(Err(RealtimeError::Disconnected))
    }

    /// Connects with whatever session the provider currently holds.
    pub async fn connect_with(&self, provider: &dyn CredentialProvider) -> Result<(), RealtimeError> {
        let credentials = provider.credentials().ok_or(RealtimeError::Unauthenticated)?;
        self.connect(credentials).await
    }

    /// Restarts a `Failed` channel with the credentials it last used.
    pub async fn reconnect(&self) -> Result<(), RealtimeError> {
        let credentials = {
            let shared = self.inner.lock();
            match shared.channel.state() {
                ConnectionState::Failed => shared.channel.credentials().cloned(),
                ConnectionState::Disconnected => None,
                active => return Err(RealtimeError::AlreadyActive { state: active }),
            }
        };
        let credentials = credentials.ok_or(RealtimeError::Unauthenticated)?;
        self.connect(credentials).await
    }

    /// Tears the channel down if the provider no longer holds an
    /// authenticated session. Returns whether it did.
    pub fn sync_credentials(&self, provider: &dyn CredentialProvider) -> bool {
        if provider.is_authenticated() || self.state() == ConnectionState::Disconnected {
            return false;
        }
        tracing::info!(namespace = %self.namespace(), "Session no longer authenticated, closing channel");
        self.disconnect();
        true
    }

    /// Emits an event. Never blocks and never fails: the event is written
    /// right away while connected and queued in order otherwise.
    pub fn send(&self, event: OutboundEvent) {
        let mut shared = self.inner.lock();
        let name = event.name();

        shared.outbox.backlog.fetch_add(1, Ordering::SeqCst);
        if shared.outbox.rx.is_some() {
            if shared.outbox.parked.enqueue(QueuedMessage::new(event)).is_some() {
                shared.outbox.backlog.fetch_sub(1, Ordering::SeqCst);
            }
            return;
        }

        if shared
            .outbox
            .tx
            .send(Command::Send(QueuedMessage::new(event)))
            .is_err()
        {
            shared.outbox.backlog.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(namespace = %shared.channel.namespace(), event = name, "Channel task is gone, dropping outbound event");
            return;
        }

        tracing::trace!(
            namespace = %shared.channel.namespace(),
            event = name,
            state = %shared.channel.state(),
            "Accepted outbound event"
        );
    }

    /// Closes the channel from any state.
    ///
    /// Stops the background task and any pending retry, discards queued
    /// messages and drops every subscription. Idempotent, and safe to call
    /// from inside an event handler.
    pub fn disconnect(&self) {
        let previous = {
            let mut shared = self.inner.lock();
            if let Some(cancel) = shared.cancel.take() {
                cancel.cancel();
            }
            shared.generation += 1;
            shared.outbox = Outbox::new(self.inner.options.queue);
            let previous = shared.channel.reset();
            self.inner.state_tx.send_replace(ConnectionState::Disconnected);
            previous
        };

        self.inner.router.clear();
        if previous != ConnectionState::Disconnected {
            tracing::info!(previous = %previous, "Channel disconnected");
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("status", &self.status())
            .finish()
    }
}
