//! In-memory transport for tests and demos.
//!
//! Provides a scriptable backend:
//! - reachable or unreachable, accepting or rejecting handshakes
//! - records every handshake and every outbound frame
//! - injects inbound frames and forces link loss
//!
//! # Example
//!
//! ```ignore
//! let connector = InMemoryConnector::offline();
//! let manager = ConnectionManager::new("responder", Arc::new(connector.clone()));
//!
//! manager.send(event);
//! connector.set_available(true);
//! let frames = connector.wait_for_sent(1).await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::domain::connection::{Handshake, Role};
use crate::domain::events::Frame;
use crate::domain::foundation::RealtimeError;
use crate::ports::{Connector, TransportLink};

/// A handshake as the backend saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRecord {
    pub namespace: String,
    pub token: String,
    pub role: Role,
}

enum Signal {
    Frame(Frame),
    Drop(String),
}

#[derive(Default)]
struct Backend {
    available: bool,
    rejection: Option<String>,
    opens: usize,
    handshakes: Vec<HandshakeRecord>,
    sent: Vec<Frame>,
    live: usize,
    peak_live: usize,
    /// Successful writes left on the current link before it breaks.
    send_budget: Option<usize>,
    current: Option<mpsc::UnboundedSender<Signal>>,
}

/// Scriptable in-memory backend. Clones share the same state.
#[derive(Clone)]
pub struct InMemoryConnector {
    backend: Arc<Mutex<Backend>>,
    sent_count: Arc<watch::Sender<usize>>,
}

impl InMemoryConnector {
    /// A reachable backend that accepts every handshake.
    pub fn new() -> Self {
        let (sent_count, _) = watch::channel(0);
        Self {
            backend: Arc::new(Mutex::new(Backend {
                available: true,
                ..Backend::default()
            })),
            sent_count: Arc::new(sent_count),
        }
    }

    /// An unreachable backend.
    pub fn offline() -> Self {
        let connector = Self::new();
        connector.set_available(false);
        connector
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    pub fn reject_handshakes(&self, reason: impl Into<String>) {
        self.lock().rejection = Some(reason.into());
    }

    pub fn accept_handshakes(&self) {
        self.lock().rejection = None;
    }

    /// Number of `open` calls, successful or not.
    pub fn open_count(&self) -> usize {
        self.lock().opens
    }

    /// Handshakes that reached the backend.
    pub fn handshakes(&self) -> Vec<HandshakeRecord> {
        self.lock().handshakes.clone()
    }

    pub fn sent_frames(&self) -> Vec<Frame> {
        self.lock().sent.clone()
    }

    /// Names of the sent frames, in order.
    pub fn sent_events(&self) -> Vec<String> {
        self.lock().sent.iter().map(|f| f.event.clone()).collect()
    }

    /// Waits until at least `count` frames were written, then returns them all.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<Frame> {
        let mut rx = self.sent_count.subscribe();
        let _ = rx.wait_for(|sent| *sent >= count).await;
        self.sent_frames()
    }

    /// Delivers a frame on the current link. Returns false when no link is open.
    pub fn push_inbound(&self, frame: Frame) -> bool {
        self.lock()
            .current
            .as_ref()
            .map(|link| link.send(Signal::Frame(frame)).is_ok())
            .unwrap_or(false)
    }

    /// Breaks the current link as if the network dropped.
    pub fn drop_link(&self, reason: impl Into<String>) -> bool {
        self.lock()
            .current
            .take()
            .map(|link| link.send(Signal::Drop(reason.into())).is_ok())
            .unwrap_or(false)
    }

    /// Makes the current link fail after `count` more successful writes.
    pub fn fail_sends_after(&self, count: usize) {
        self.lock().send_budget = Some(count);
    }

    /// Links currently open.
    pub fn live_links(&self) -> usize {
        self.lock().live
    }

    /// Highest number of simultaneously open links seen.
    pub fn peak_live_links(&self) -> usize {
        self.lock().peak_live
    }
}

impl Default for InMemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn open(
        &self,
        namespace: &str,
        handshake: &Handshake,
    ) -> Result<Box<dyn TransportLink>, RealtimeError> {
        let mut backend = self.lock();
        backend.opens += 1;

        if !backend.available {
            return Err(RealtimeError::Transport("backend unreachable".to_string()));
        }

        let hello = handshake.to_frame();
        backend.handshakes.push(HandshakeRecord {
            namespace: namespace.to_string(),
            token: hello.data["token"].as_str().unwrap_or_default().to_string(),
            role: handshake.role,
        });

        if let Some(reason) = &backend.rejection {
            return Err(RealtimeError::AuthRejected(reason.clone()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        backend.current = Some(tx);
        backend.send_budget = None;
        backend.live += 1;
        backend.peak_live = backend.peak_live.max(backend.live);

        Ok(Box::new(InMemoryLink {
            backend: Arc::clone(&self.backend),
            sent_count: Arc::clone(&self.sent_count),
            inbound: rx,
        }))
    }
}

struct InMemoryLink {
    backend: Arc<Mutex<Backend>>,
    sent_count: Arc<watch::Sender<usize>>,
    inbound: mpsc::UnboundedReceiver<Signal>,
}

#[async_trait]
impl TransportLink for InMemoryLink {
    async fn send(&mut self, frame: &Frame) -> Result<(), RealtimeError> {
        let sent = {
            let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
            match backend.send_budget {
                Some(0) => return Err(RealtimeError::Transport("link lost while sending".to_string())),
                Some(left) => backend.send_budget = Some(left - 1),
                None => {}
            }
            backend.sent.push(frame.clone());
            backend.sent.len()
        };
        self.sent_count.send_replace(sent);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Frame, RealtimeError>> {
        match self.inbound.recv().await? {
            Signal::Frame(frame) => Some(Ok(frame)),
            Signal::Drop(reason) => Some(Err(RealtimeError::Transport(reason))),
        }
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

impl Drop for InMemoryLink {
    fn drop(&mut self) {
        let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);
        backend.live = backend.live.saturating_sub(1);
    }
}
