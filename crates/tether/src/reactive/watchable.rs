#![forbid(unsafe_code)]

//! Scoped event emission.
//!
//! A [`Watchable<E>`] owns the observers of some collection. Each mutation
//! opens an [`EventScope`] describing the change, applies it, and lets the
//! scope drop; the drop publishes the event to observers.
//!
//! # Invariants
//!
//! 1. An event is published at most once, after its mutation is applied.
//! 2. `version` increments by exactly 1 per published event.
//! 3. A scope dropped during a panic publishes nothing.

use std::cell::Cell;
use std::fmt;

use super::listener::ListenerList;

/// Observers plus a count of published events.
pub struct Watchable<E> {
    observers: ListenerList<E>,
    version: Cell<u64>,
}

impl<E> Default for Watchable<E> {
    fn default() -> Self {
        Self {
            observers: ListenerList::default(),
            version: Cell::new(0),
        }
    }
}

impl<E> fmt::Debug for Watchable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watchable")
            .field("version", &self.version.get())
            .field("observers", &self.observers)
            .finish()
    }
}

impl<E: 'static> Watchable<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope for `event`. The event is published when the scope drops.
    #[must_use = "the event is published when the scope drops"]
    pub fn scope(&self, event: E) -> EventScope<'_, E> {
        EventScope {
            owner: self,
            event: Some(event),
        }
    }

    /// Publish `event` immediately.
    pub fn publish(&self, event: &E) {
        self.version.set(self.version.get() + 1);
        self.observers.notify(event);
    }

    #[must_use]
    pub fn observers(&self) -> &ListenerList<E> {
        &self.observers
    }

    /// Number of events published so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.get()
    }
}

/// An open event. Publishes on drop unless cancelled or unwinding.
pub struct EventScope<'a, E: 'static> {
    owner: &'a Watchable<E>,
    event: Option<E>,
}

impl<E: 'static> EventScope<'_, E> {
    /// The pending event.
    #[must_use]
    pub fn event(&self) -> Option<&E> {
        self.event.as_ref()
    }

    /// Close the scope without publishing, returning the event.
    pub fn cancel(mut self) -> Option<E> {
        self.event.take()
    }
}

impl<E: 'static> Drop for EventScope<'_, E> {
    fn drop(&mut self) {
        let Some(event) = self.event.take() else {
            return;
        };
        if std::thread::panicking() {
            tracing::debug!("event scope abandoned during unwind");
            return;
        }
        self.owner.publish(&event);
    }
}
