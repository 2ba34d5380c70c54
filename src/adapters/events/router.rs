//! Event router - synchronous fan-out of inbound events to subscribers.
//!
//! Features:
//! - Named subscriptions per [`EventKind`] and a separate wildcard category
//! - Snapshot delivery: (un)subscribing inside a handler does not affect the
//!   pass already in progress
//! - Fault isolation: a handler that errors or panics is logged and reported
//!   to fault listeners, and the remaining handlers still run
//! - O(1) removal through an id-indexed arena
//!
//! # Example
//!
//! ```ignore
//! let router = EventRouter::new();
//!
//! let sub = router.subscribe(EventKind::IncidentUpdate, |event| {
//!     println!("{:?}", event);
//!     Ok(())
//! });
//!
//! router.dispatch(&event);
//! sub.unsubscribe();
//! ```

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::domain::events::{EventKind, InboundEvent};
use crate::domain::foundation::HandlerId;
use crate::ports::{CallbackFault, EventHandler, HandlerError};

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// One named event.
    Event(EventKind),
    /// Every event, including unrecognized frames.
    Any,
    /// Callback faults raised by other handlers.
    Fault,
}

impl From<EventKind> for Topic {
    fn from(kind: EventKind) -> Self {
        Topic::Event(kind)
    }
}

type FaultListener = Arc<dyn Fn(&CallbackFault) + Send + Sync>;

enum Callback {
    Event(Arc<dyn EventHandler>),
    Fault(FaultListener),
}

struct Entry {
    topic: Topic,
    callback: Callback,
}

/// Registration order for one topic. Removed ids stay in `ids` until the
/// next compaction; `dead` counts them.
#[derive(Default)]
struct Lane {
    ids: Vec<HandlerId>,
    dead: usize,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: HashMap<HandlerId, Entry>,
    lanes: HashMap<Topic, Lane>,
}

impl Registry {
    fn insert(&mut self, topic: Topic, callback: Callback) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId::from_raw(self.next_id);
        self.entries.insert(id, Entry { topic, callback });
        self.lanes.entry(topic).or_default().ids.push(id);
        id
    }

    fn remove(&mut self, topic: Topic, id: HandlerId) -> bool {
        match self.entries.get(&id) {
            Some(entry) if entry.topic == topic => {}
            _ => return false,
        }
        self.entries.remove(&id);

        if let Some(lane) = self.lanes.get_mut(&topic) {
            lane.dead += 1;
            if lane.dead * 2 > lane.ids.len() {
                let entries = &self.entries;
                lane.ids.retain(|id| entries.contains_key(id));
                lane.dead = 0;
            }
        }
        true
    }

    fn live(&self, topic: Topic) -> impl Iterator<Item = (HandlerId, &Entry)> + '_ {
        self.lanes
            .get(&topic)
            .into_iter()
            .flat_map(|lane| lane.ids.iter())
            .filter_map(move |id| self.entries.get(id).map(|entry| (*id, entry)))
    }

    fn event_handlers(&self, topic: Topic) -> Vec<Arc<dyn EventHandler>> {
        self.live(topic)
            .filter_map(|(_, entry)| match &entry.callback {
                Callback::Event(handler) => Some(Arc::clone(handler)),
                Callback::Fault(_) => None,
            })
            .collect()
    }

    fn fault_listeners(&self) -> Vec<FaultListener> {
        self.live(Topic::Fault)
            .filter_map(|(_, entry)| match &entry.callback {
                Callback::Fault(listener) => Some(Arc::clone(listener)),
                Callback::Event(_) => None,
            })
            .collect()
    }

    fn count(&self, topic: Topic) -> usize {
        self.live(topic).count()
    }
}

struct RouterInner {
    registry: Mutex<Registry>,
}

impl RouterInner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Closure adapter for [`EventHandler`].
struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&InboundEvent) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &InboundEvent) -> Result<(), HandlerError> {
        (self.f)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Publish/subscribe hub owned by one connection manager.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct EventRouter {
    inner: Arc<RouterInner>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RouterInner {
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Registers a closure for one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, f: F) -> Subscription
    where
        F: Fn(&InboundEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register_fn(Topic::Event(kind), f)
    }

    pub fn subscribe_handler(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> Subscription {
        self.register(Topic::Event(kind), Callback::Event(handler))
    }

    /// Registers a closure for every event, including unrecognized frames.
    pub fn subscribe_all<F>(&self, f: F) -> Subscription
    where
        F: Fn(&InboundEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.register_fn(Topic::Any, f)
    }

    pub fn subscribe_all_handler(&self, handler: Arc<dyn EventHandler>) -> Subscription {
        self.register(Topic::Any, Callback::Event(handler))
    }

    /// Registers a listener for callback faults.
    pub fn on_fault<F>(&self, f: F) -> Subscription
    where
        F: Fn(&CallbackFault) + Send + Sync + 'static,
    {
        self.register(Topic::Fault, Callback::Fault(Arc::new(f)))
    }

    /// Removes a subscription. Unknown ids are ignored.
    ///
    /// Returns whether something was removed.
    pub fn unsubscribe(&self, topic: impl Into<Topic>, id: HandlerId) -> bool {
        self.inner.lock().remove(topic.into(), id)
    }

    /// Drops every subscription, fault listeners included.
    pub fn clear(&self) {
        let mut registry = self.inner.lock();
        let removed = registry.entries.len();
        registry.entries.clear();
        registry.lanes.clear();
        if removed > 0 {
            tracing::debug!(removed, "Cleared event subscriptions");
        }
    }

    /// Number of live subscriptions on a topic.
    pub fn subscriber_count(&self, topic: impl Into<Topic>) -> usize {
        self.inner.lock().count(topic.into())
    }

    /// Delivers `event` to the named subscribers of its kind, then to the
    /// wildcard subscribers, each group in registration order.
    ///
    /// Returns how many handlers completed without a fault.
    pub fn dispatch(&self, event: &InboundEvent) -> usize {
        let targets = {
            let registry = self.inner.lock();
            let mut targets = match event.kind() {
                Some(kind) => registry.event_handlers(Topic::Event(kind)),
                None => Vec::new(),
            };
            targets.extend(registry.event_handlers(Topic::Any));
            targets
        };

        if targets.is_empty() {
            tracing::trace!(event = event.name(), "No subscribers for event");
            return 0;
        }

        let mut delivered = 0;
        for handler in targets {
            match invoke(handler.as_ref(), event) {
                Ok(()) => delivered += 1,
                Err(message) => self.report(CallbackFault {
                    handler: handler.name().to_string(),
                    event: event.name().to_string(),
                    message,
                }),
            }
        }
        delivered
    }

    fn register_fn<F>(&self, topic: Topic, f: F) -> Subscription
    where
        F: Fn(&InboundEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        let mut registry = self.inner.lock();
        let name = format!("handler-{}", registry.next_id + 1);
        let id = registry.insert(topic, Callback::Event(Arc::new(FnHandler { name, f })));
        drop(registry);
        self.handle(topic, id)
    }

    fn register(&self, topic: Topic, callback: Callback) -> Subscription {
        let id = self.inner.lock().insert(topic, callback);
        self.handle(topic, id)
    }

    fn handle(&self, topic: Topic, id: HandlerId) -> Subscription {
        Subscription {
            id,
            topic,
            router: Arc::downgrade(&self.inner),
        }
    }

    fn report(&self, fault: CallbackFault) {
        tracing::warn!(
            handler = %fault.handler,
            event = %fault.event,
            error = %fault.message,
            "Event handler failed"
        );

        let listeners = self.inner.lock().fault_listeners();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&fault))).is_err() {
                tracing::error!(event = %fault.event, "Fault listener panicked");
            }
        }
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.lock();
        f.debug_struct("EventRouter")
            .field("subscriptions", &registry.entries.len())
            .finish()
    }
}

fn invoke(handler: &dyn EventHandler, event: &InboundEvent) -> Result<(), String> {
    match catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Handle to one registration.
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: HandlerId,
    topic: Topic,
    router: Weak<RouterInner>,
}

impl Subscription {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Removes the registration. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if let Some(inner) = self.router.upgrade() {
            inner.lock().remove(self.topic, self.id);
        }
    }

    /// Whether the registration is still live.
    pub fn is_active(&self) -> bool {
        self.router
            .upgrade()
            .map(|inner| inner.lock().entries.contains_key(&self.id))
            .unwrap_or(false)
    }
}
