//! Event bus
//!
//! Event types are registered by name on an [`EventManager`] and hold an
//! ordered list of listeners. Dispatch offers an event to each listener in
//! turn, skipping listeners vetoed by one of their filters, and stops at the
//! first listener that consumes it.
//!
//! # Example
//!
//! ```no_run
//! use taskloom::runtime::event::{Event, EventManager};
//!
//! let events = EventManager::new().unwrap();
//! events.create_event_type("ping").unwrap();
//! events.add_callback("ping", |e| e.contains("reply")).unwrap();
//! events.push_event(Event::new("ping").with("reply", true)).unwrap();
//! ```

pub mod codec;
pub mod event;
pub mod event_type;
pub mod listener;
pub mod manager;

pub use codec::{CodecError, EventCodec, JsonCodec};
pub use event::Event;
pub use event_type::EventType;
pub use listener::{CallbackListener, EventFilter, EventListener, Listener, ListenerId};
pub use manager::EventManager;

use serde::{Deserialize, Serialize};

/// Default name of the dispatch worker thread.
pub const DEFAULT_DISPATCH_THREAD: &str = "event-dispatch";

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfig {
    /// Name of the worker thread running pushed events.
    #[serde(default = "default_dispatch_thread")]
    pub dispatch_thread: String,
}

fn default_dispatch_thread() -> String {
    DEFAULT_DISPATCH_THREAD.to_string()
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            dispatch_thread: default_dispatch_thread(),
        }
    }
}

#[cfg(test)]
mod tests;
