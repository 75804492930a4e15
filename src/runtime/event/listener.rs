//! Event listeners and filters

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::error;

use super::event::Event;
use crate::runtime::scheduler::task::panic_message;

/// Receives events during dispatch.
pub trait EventListener: Send + Sync {
    /// Handle `event`. Returning `true` consumes it and stops dispatch.
    fn on_event(
        &self,
        event: &Event,
    ) -> bool;
}

/// Wraps a plain callback as a listener.
pub struct CallbackListener<F> {
    callback: F,
}

impl<F> CallbackListener<F>
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> EventListener for CallbackListener<F>
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn on_event(
        &self,
        event: &Event,
    ) -> bool {
        (self.callback)(event)
    }
}

/// Vetoes a listener for some events.
pub trait EventFilter: Send + Sync {
    /// Return `true` to skip the listener for this event.
    fn skip(
        &self,
        event: &Event,
    ) -> bool;
}

impl<F> EventFilter for F
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn skip(
        &self,
        event: &Event,
    ) -> bool {
        self(event)
    }
}

/// Unique listener identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub usize);

impl ListenerId {
    fn next() -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
        ListenerId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What happened when a listener saw an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// A filter vetoed the listener.
    Skipped,
    /// Invoked; the event was not consumed.
    Passed,
    /// Invoked and consumed.
    Consumed,
    /// The listener or one of its filters panicked.
    Panicked(String),
}

struct ListenerInner {
    id: ListenerId,
    handler: Arc<dyn EventListener>,
    filters: RwLock<SmallVec<[Arc<dyn EventFilter>; 2]>>,
    invocations: AtomicUsize,
}

/// A co-owned, optionally filtered listener handle.
#[derive(Clone)]
pub struct Listener {
    inner: Arc<ListenerInner>,
}

impl fmt::Debug for Listener {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.inner.id)
            .field("filters", &self.filters_len())
            .field("invocations", &self.invocations())
            .finish()
    }
}

impl Listener {
    /// Co-own an existing listener object.
    pub fn new(handler: Arc<dyn EventListener>) -> Self {
        Self {
            inner: Arc::new(ListenerInner {
                id: ListenerId::next(),
                handler,
                filters: RwLock::new(SmallVec::new()),
                invocations: AtomicUsize::new(0),
            }),
        }
    }

    /// Wrap a plain callback.
    pub fn from_callback<F>(callback: F) -> Self
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Self::new(Arc::new(CallbackListener::new(callback)))
    }

    #[inline]
    pub fn id(&self) -> ListenerId {
        self.inner.id
    }

    /// Append a filter; filters run in insertion order.
    pub fn add_filter(
        &self,
        filter: impl EventFilter + 'static,
    ) {
        self.inner.filters.write().push(Arc::new(filter));
    }

    /// Builder form of [`Listener::add_filter`].
    pub fn with_filter(
        self,
        filter: impl EventFilter + 'static,
    ) -> Self {
        self.add_filter(filter);
        self
    }

    pub fn clear_filters(&self) {
        self.inner.filters.write().clear();
    }

    pub fn filters_len(&self) -> usize {
        self.inner.filters.read().len()
    }

    /// Times `on_event` has been called.
    #[inline]
    pub fn invocations(&self) -> usize {
        self.inner.invocations.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    #[inline]
    pub fn ptr_eq(
        &self,
        other: &Listener,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the filters, then the handler.
    pub(crate) fn deliver(
        &self,
        event: &Event,
    ) -> Delivery {
        let filters = self.inner.filters.read().clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            if filters.iter().any(|filter| filter.skip(event)) {
                return Delivery::Skipped;
            }
            self.inner.invocations.fetch_add(1, Ordering::SeqCst);
            if self.inner.handler.on_event(event) {
                Delivery::Consumed
            } else {
                Delivery::Passed
            }
        }));

        outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            error!(
                event = %event.name(),
                listener = self.inner.id.0,
                "listener panicked on '{}': {}",
                event.name(),
                message
            );
            Delivery::Panicked(message)
        })
    }
}
