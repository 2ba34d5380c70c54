//! EventLog - Bounded history of received events.
//!
//! Attaches to a router as a wildcard listener and keeps the most recent
//! events, oldest first, for activity feeds and debugging views.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapters::events::{EventRouter, Subscription};
use crate::domain::events::IncomingEvent;

#[derive(Debug)]
pub struct EventLog {
    entries: Arc<Mutex<VecDeque<IncomingEvent>>>,
    capacity: usize,
    subscription: Subscription,
}

impl EventLog {
    /// Starts recording every event `router` dispatches. A capacity of zero
    /// is treated as one.
    pub fn attach(router: &EventRouter, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let entries = Arc::new(Mutex::new(VecDeque::with_capacity(capacity)));
        let sink = Arc::clone(&entries);
        let subscription = router.subscribe_all(move |event| {
            let mut entries = sink.lock().unwrap_or_else(PoisonError::into_inner);
            if entries.len() == capacity {
                entries.pop_front();
            }
            entries.push_back(IncomingEvent::from(event));
            Ok(())
        });

        Self {
            entries,
            capacity,
            subscription,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<IncomingEvent>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entries(&self) -> Vec<IncomingEvent> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<IncomingEvent> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Whether the log is still attached to a live router subscription.
    pub fn is_recording(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stops recording and returns what was captured.
    pub fn detach(self) -> Vec<IncomingEvent> {
        self.subscription.unsubscribe();
        let mut entries = self.lock();
        entries.drain(..).collect()
    }
}
