//! Outbound message queue for a channel that is not currently connected.
//!
//! Messages are kept in enqueue order and written head first. A message
//! leaves the queue only once the link accepted it, so a link lost halfway
//! through a flush leaves the rest queued for the next connection.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::events::{Frame, OutboundEvent};
use crate::domain::foundation::{MessageId, RealtimeError, Timestamp};
use crate::ports::TransportLink;

/// One outbound event waiting to be written.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub id: MessageId,
    pub event: OutboundEvent,
    pub enqueued_at: Timestamp,
    enqueued_instant: Instant,
}

impl QueuedMessage {
    pub fn new(event: OutboundEvent) -> Self {
        Self {
            id: MessageId::new(),
            event,
            enqueued_at: Timestamp::now(),
            enqueued_instant: Instant::now(),
        }
    }

    /// How long the message has been waiting.
    pub fn age(&self) -> Duration {
        self.enqueued_instant.elapsed()
    }

    pub fn frame(&self) -> Result<Frame, RealtimeError> {
        self.event.to_frame()
    }
}

/// Retention limits. Both unset means unbounded and never expiring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueuePolicy {
    /// Messages older than this are dropped at flush time.
    pub max_age: Option<Duration>,
    /// When full, enqueueing drops the oldest message.
    pub capacity: Option<usize>,
}

impl QueuePolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Result of one flush.
#[derive(Debug, Default)]
pub struct FlushOutcome {
    pub sent: usize,
    pub expired: usize,
    /// Messages that could not be encoded and were dropped.
    pub discarded: usize,
    /// Set when the link failed; the failed message is still queued.
    pub error: Option<RealtimeError>,
}

impl FlushOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Messages that left the queue, whichever way.
    pub fn removed(&self) -> usize {
        self.sent + self.expired + self.discarded
    }
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: VecDeque<QueuedMessage>,
    policy: QueuePolicy,
}

impl MessageQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            messages: VecDeque::new(),
            policy,
        }
    }

    /// Appends at the tail. Returns the message evicted to respect capacity.
    pub fn enqueue(&mut self, message: QueuedMessage) -> Option<QueuedMessage> {
        let evicted = match self.policy.capacity {
            Some(capacity) if self.messages.len() >= capacity => self.messages.pop_front(),
            _ => None,
        };
        if let Some(dropped) = &evicted {
            tracing::warn!(
                event = dropped.event.name(),
                capacity = ?self.policy.capacity,
                "Outbound queue full, dropping oldest message"
            );
        }

        tracing::debug!(event = message.event.name(), queued = self.messages.len() + 1, "Queued outbound message");
        self.messages.push_back(message);
        evicted
    }

    /// Puts a message that could not be written back at the head.
    pub fn requeue_front(&mut self, message: QueuedMessage) {
        self.messages.push_front(message);
    }

    /// Writes queued messages head first until the queue is empty or the
    /// link fails.
    pub async fn flush(&mut self, link: &mut dyn TransportLink) -> FlushOutcome {
        let mut outcome = FlushOutcome::default();

        while let Some(head) = self.messages.front() {
            if self.is_expired(head) {
                tracing::warn!(event = head.event.name(), age_ms = head.age().as_millis() as u64, "Dropping expired outbound message");
                self.messages.pop_front();
                outcome.expired += 1;
                continue;
            }

            let frame = match head.frame() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(event = head.event.name(), error = %e, "Dropping unencodable outbound message");
                    self.messages.pop_front();
                    outcome.discarded += 1;
                    continue;
                }
            };

            if let Err(e) = link.send(&frame).await {
                outcome.error = Some(e);
                break;
            }
            self.messages.pop_front();
            outcome.sent += 1;
        }

        if outcome.sent > 0 || outcome.expired > 0 {
            tracing::debug!(
                sent = outcome.sent,
                expired = outcome.expired,
                remaining = self.messages.len(),
                "Flushed outbound queue"
            );
        }
        outcome
    }

    fn is_expired(&self, message: &QueuedMessage) -> bool {
        self.policy
            .max_age
            .map(|max_age| message.age() > max_age)
            .unwrap_or(false)
    }

    /// Discards everything. Returns how many messages were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.messages.len();
        self.messages.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Event names in queue order.
    pub fn pending_events(&self) -> Vec<&'static str> {
        self.messages.iter().map(|m| m.event.name()).collect()
    }
}
