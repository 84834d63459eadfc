#![deny(missing_docs)]
//! Event bus (C8, §4.5) — synchronous, in-process fan-out.
//!
//! [`EventBus`] dispatches each published [`Event`] to every subscribed
//! [`EventListener`] in registration order. Ordering across listeners is
//! not guaranteed by contract, but this implementation happens to
//! preserve it; ordering *to* a single listener is always publication
//! order, since dispatch for one event finishes before the next
//! `publish` call is accepted.
//!
//! `on_event` is a plain, non-async function: per §4.5, "listeners may
//! not block the publisher". A listener that needs to do async work
//! (write to a database, call a webhook) is expected to hand off —
//! typically by cloning what it needs and spawning a task — rather than
//! await anything inline.

use agentex_core::Event;
use std::sync::Arc;

/// Receives events published on an [`EventBus`].
///
/// Implementations: a listener that logs via `tracing`, one that
/// forwards to a metrics sink, one that appends to an in-memory buffer
/// for tests. `on_event` must return promptly; see the module docs.
pub trait EventListener: Send + Sync {
    /// Handle one published event.
    fn on_event(&self, event: &Event);
}

/// Synchronous in-process event bus.
///
/// Not `Clone`; share via `Arc<EventBus>` if multiple owners need to
/// publish. Subscription is expected to happen once at platform init
/// (§6 "Events": "subscribers attach at platform init and receive until
/// shutdown") — there is no `unsubscribe`.
pub struct EventBus {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl EventBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    /// Subscribe a listener. Listeners are dispatched to in the order
    /// they were added.
    pub fn subscribe(&mut self, listener: Arc<dyn EventListener>) {
        self.listeners.push(listener);
    }

    /// Publish an event to every subscribed listener, in registration
    /// order.
    pub fn publish(&self, event: Event) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }

    /// Number of subscribed listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether any listeners are subscribed.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
