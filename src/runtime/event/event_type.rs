//! Event types and listener dispatch

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::event::Event;
use super::listener::{Delivery, EventListener, Listener};
use crate::util::hash::hash_name;

/// A named, hashed category of events with its own ordered listener list.
pub struct EventType {
    name: String,
    hash: u64,
    listeners: RwLock<Vec<Listener>>,
}

impl fmt::Debug for EventType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EventType")
            .field("name", &self.name)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("listeners", &self.listeners_len())
            .finish()
    }
}

impl EventType {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let hash = hash_name(&name);
        Self {
            name,
            hash,
            listeners: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Co-own `listener` and append it to the dispatch order.
    pub fn add_listener(
        &self,
        listener: Arc<dyn EventListener>,
    ) -> Listener {
        self.attach(Listener::new(listener))
    }

    /// Wrap `callback` as a listener and append it.
    pub fn add_callback<F>(
        &self,
        callback: F,
    ) -> Listener
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.attach(Listener::from_callback(callback))
    }

    /// Append an existing handle. The same handle may be attached to several
    /// event types.
    pub fn attach(
        &self,
        listener: Listener,
    ) -> Listener {
        self.listeners.write().push(listener.clone());
        listener
    }

    /// Detach `listener`. Returns false when it was not attached.
    pub fn remove_listener(
        &self,
        listener: &Listener,
    ) -> bool {
        let mut listeners = self.listeners.write();
        match listeners.iter().position(|l| l.ptr_eq(listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn listeners_len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Detach every listener.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Offer `event` to each listener in insertion order until one consumes it.
    ///
    /// Listeners attached or removed while dispatch is running take effect on
    /// the next event.
    pub fn dispatch(
        &self,
        event: &Event,
    ) -> bool {
        let snapshot: Vec<Listener> = self.listeners.read().clone();
        for listener in &snapshot {
            match listener.deliver(event) {
                Delivery::Consumed => {
                    trace!(event = %self.name, listener = listener.id().0, "event consumed");
                    return true;
                }
                Delivery::Skipped | Delivery::Passed | Delivery::Panicked(_) => {}
            }
        }
        false
    }
}
