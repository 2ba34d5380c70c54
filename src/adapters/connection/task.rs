//! Background task driving one channel: connect, serve, retry, give up.
//!
//! The task is the single owner of the transport link and the outbound
//! queue. It consumes the manager's command stream in order, so messages
//! keep their send order whether they are written directly or buffered.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use super::manager::Shared;
use super::policy::ReconnectPolicy;
use crate::adapters::events::EventRouter;
use crate::adapters::queue::{MessageQueue, QueuedMessage};
use crate::domain::connection::{Channel, ConnectionState, Handshake};
use crate::domain::events::{
    ConnectErrorInfo, ConnectionStatus, Frame, InboundEvent, ReconnectFailedInfo, ReconnectedInfo,
};
use crate::domain::foundation::{RealtimeError, ValidationError};
use crate::ports::{Connector, TransportLink};

pub(super) type Ready = oneshot::Sender<Result<(), RealtimeError>>;

/// Instructions from the manager, processed in arrival order.
pub(super) enum Command {
    Send(QueuedMessage),
    /// Restart a `Failed` channel.
    Reconnect { handshake: Handshake, ready: Ready },
}

enum SessionEnd {
    Cancelled,
    Lost(RealtimeError),
}

pub(super) struct ChannelTask {
    pub namespace: String,
    pub handshake: Handshake,
    pub connector: Arc<dyn Connector>,
    pub router: EventRouter,
    pub policy: ReconnectPolicy,
    pub queue: MessageQueue,
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub ready: Option<Ready>,
    pub shared: Arc<Mutex<Shared>>,
    pub state_tx: Arc<watch::Sender<ConnectionState>>,
    pub backlog: Arc<AtomicUsize>,
    pub generation: u64,
    pub cancel: CancellationToken,
}

impl ChannelTask {
    pub async fn run(mut self) {
        loop {
            let Some(opened) = self.open().await else {
                break;
            };

            let error = match opened {
                Ok(link) => match self.serve(link).await {
                    SessionEnd::Cancelled => break,
                    SessionEnd::Lost(error) => error,
                },
                Err(error) => error,
            };

            let Some(attempts) = self.record_failure(error) else {
                break;
            };

            let resume = if self.policy.is_exhausted(attempts) {
                self.give_up() && self.idle_until_reconnect().await
            } else {
                self.wait_before_retry().await
            };
            if !resume {
                break;
            }
        }

        self.resolve(Err(RealtimeError::Disconnected));
        if !self.queue.is_empty() {
            tracing::debug!(namespace = %self.namespace, pending = ?self.queue.pending_events(), "Discarding queued events");
        }
        let dropped = self.queue.clear();
        tracing::debug!(namespace = %self.namespace, dropped, "Channel task stopped");
    }

    /// Opens a link, queueing whatever is sent meanwhile. `None` when the
    /// channel was torn down first.
    async fn open(&mut self) -> Option<Result<Box<dyn TransportLink>, RealtimeError>> {
        let connector = Arc::clone(&self.connector);
        let namespace = self.namespace.clone();
        let handshake = self.handshake.clone();
        let open = async move { connector.open(&namespace, &handshake).await };
        tokio::pin!(open);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                command = self.commands.recv() => match command {
                    Some(command) => self.buffer(command),
                    None => return None,
                },
                result = &mut open => return Some(result),
            }
        }
    }

    /// Moves a command into the queue while no link is usable.
    fn buffer(&mut self, command: Command) {
        match command {
            Command::Send(message) => self.hold(message),
            Command::Reconnect { ready, .. } => {
                let state = *self.state_tx.borrow();
                let _ = ready.send(Err(RealtimeError::AlreadyActive { state }));
            }
        }
    }

    /// Applies a state change unless the channel was torn down or restarted
    /// since this task was spawned. Publishes the new state.
    fn update<T>(
        &self,
        change: impl FnOnce(&mut Channel) -> Result<T, ValidationError>,
    ) -> Option<T> {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.generation != self.generation || self.cancel.is_cancelled() {
            return None;
        }

        match change(&mut shared.channel) {
            Ok(value) => {
                self.state_tx.send_replace(shared.channel.state());
                Some(value)
            }
            Err(e) => {
                tracing::error!(namespace = %self.namespace, error = %e, "Illegal channel transition");
                None
            }
        }
    }

    async fn serve(&mut self, mut link: Box<dyn TransportLink>) -> SessionEnd {
        let end = self.session(link.as_mut()).await;
        link.close().await;
        end
    }

    async fn session(&mut self, link: &mut dyn TransportLink) -> SessionEnd {
        let Some((previous, attempts)) = self.update(Channel::accept) else {
            return SessionEnd::Cancelled;
        };
        tracing::info!(namespace = %self.namespace, attempts, "Channel connected");

        // Sends that raced the handshake join the queue, so its limits apply
        // and they are flushed in order.
        while let Ok(command) = self.commands.try_recv() {
            self.buffer(command);
        }

        self.router
            .dispatch(&InboundEvent::ConnectionStatus(ConnectionStatus::connected()));
        if previous == ConnectionState::Reconnecting {
            self.router
                .dispatch(&InboundEvent::Reconnected(ReconnectedInfo { attempts }));
        }
        if self.cancel.is_cancelled() {
            return SessionEnd::Cancelled;
        }

        let outcome = self.queue.flush(link).await;
        self.settle(outcome.removed());
        self.resolve(Ok(()));
        if let Some(error) = outcome.error {
            return SessionEnd::Lost(error);
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                command = self.commands.recv() => match command {
                    Some(Command::Send(message)) => {
                        if let Err(error) = self.write(link, message).await {
                            return SessionEnd::Lost(error);
                        }
                    }
                    Some(Command::Reconnect { ready, .. }) => {
                        let _ = ready.send(Err(RealtimeError::AlreadyActive {
                            state: ConnectionState::Connected,
                        }));
                    }
                    None => return SessionEnd::Cancelled,
                },
                inbound = link.recv() => match inbound {
                    Some(Ok(frame)) => self.deliver(frame),
                    Some(Err(error)) => return SessionEnd::Lost(error),
                    None => {
                        return SessionEnd::Lost(RealtimeError::Transport(
                            "link closed by peer".to_string(),
                        ))
                    }
                },
            }
        }
    }

    /// Writes one message on a live link. On failure the message goes back
    /// to the head of the queue.
    async fn write(
        &mut self,
        link: &mut dyn TransportLink,
        message: QueuedMessage,
    ) -> Result<(), RealtimeError> {
        let frame = match message.frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(event = message.event.name(), error = %e, "Dropping unencodable outbound message");
                self.settle(1);
                return Ok(());
            }
        };

        match link.send(&frame).await {
            Ok(()) => {
                tracing::trace!(namespace = %self.namespace, event = %frame.event, "Sent event");
                self.settle(1);
                Ok(())
            }
            Err(error) => {
                self.queue.requeue_front(message);
                Err(error)
            }
        }
    }

    fn deliver(&self, frame: Frame) {
        let event = match InboundEvent::decode(&frame) {
            event if event.kind().is_some_and(|k| k.is_lifecycle()) => {
                tracing::debug!(namespace = %self.namespace, event = %frame.event, "Backend sent a lifecycle event name, delivering as unrecognized");
                InboundEvent::Unrecognized(frame)
            }
            InboundEvent::Malformed { kind, frame, reason } => {
                tracing::warn!(namespace = %self.namespace, event = %kind, error = %reason, "Inbound payload did not fit its type, delivering raw");
                InboundEvent::Malformed { kind, frame, reason }
            }
            event => event,
        };

        tracing::trace!(namespace = %self.namespace, event = event.name(), "Received event");
        self.router.dispatch(&event);
    }

    /// Moves to Reconnecting and reports the failure. Returns the new attempt
    /// count, or `None` when the channel is no longer ours.
    fn record_failure(&mut self, error: RealtimeError) -> Option<u32> {
        let (previous, attempts) = self.update(Channel::fail)?;
        let reason = error.to_string();
        tracing::warn!(namespace = %self.namespace, attempts, error = %reason, "Connection attempt failed");

        if previous == ConnectionState::Connected {
            self.router
                .dispatch(&InboundEvent::ConnectionStatus(ConnectionStatus::lost(reason.clone())));
        }
        self.router.dispatch(&InboundEvent::ConnectError(ConnectErrorInfo {
            error: reason,
            attempts,
        }));
        self.resolve(Err(error));

        Some(attempts)
    }

    /// Enters Failed and announces it once.
    fn give_up(&mut self) -> bool {
        let max_attempts = self.policy.max_attempts;
        if self
            .update(|channel| channel.transition(ConnectionState::Failed))
            .is_none()
        {
            return false;
        }

        tracing::error!(namespace = %self.namespace, max_attempts, "Reconnect budget exhausted");
        self.router
            .dispatch(&InboundEvent::ReconnectFailed(ReconnectFailedInfo { max_attempts }));
        true
    }

    /// Sleeps for the retry delay while buffering outbound messages.
    async fn wait_before_retry(&mut self) -> bool {
        tracing::debug!(
            namespace = %self.namespace,
            delay_ms = self.policy.delay.as_millis() as u64,
            "Waiting before reconnect"
        );
        let sleep = tokio::time::sleep(self.policy.delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                command = self.commands.recv() => match command {
                    Some(command) => self.buffer(command),
                    None => return false,
                },
                _ = &mut sleep => return true,
            }
        }
    }

    /// Parks a Failed channel until an explicit reconnect. Outbound messages
    /// keep accumulating in the queue meanwhile.
    async fn idle_until_reconnect(&mut self) -> bool {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                command = self.commands.recv() => match command {
                    Some(Command::Send(message)) => self.hold(message),
                    Some(Command::Reconnect { handshake, ready }) => {
                        tracing::info!(namespace = %self.namespace, "Reconnecting failed channel");
                        self.handshake = handshake;
                        self.ready = Some(ready);
                        return true;
                    }
                    None => return false,
                },
            }
        }
    }

    fn hold(&mut self, message: QueuedMessage) {
        if self.queue.enqueue(message).is_some() {
            self.settle(1);
        }
    }

    fn settle(&self, count: usize) {
        if count == 0 {
            return;
        }
        let _ = self
            .backlog
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(count))
            });
    }

    fn resolve(&mut self, result: Result<(), RealtimeError>) {
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(result);
        }
    }
}
