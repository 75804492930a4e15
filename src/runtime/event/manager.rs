//! Event manager
//!
//! Owns the event-type table and a dedicated dispatch worker.
//! `push_event` hands the event to that worker; `trigger_event` dispatches on
//! the calling thread.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use super::event::Event;
use super::event_type::EventType;
use super::listener::{EventListener, Listener};
use super::EventConfig;
use crate::runtime::error::{Result, RuntimeError};
use crate::runtime::scheduler::{Task, WorkerHandle, WorkerThread};
use crate::util::hash::hash_name;

/// Registry of event types plus the worker that runs pushed events.
pub struct EventManager {
    config: EventConfig,
    types: RwLock<HashMap<u64, Arc<EventType>>>,
    worker: WorkerThread,
}

impl fmt::Debug for EventManager {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("config", &self.config)
            .field("types", &self.types.read().len())
            .field("worker", self.worker.handle())
            .finish()
    }
}

impl EventManager {
    /// Create a manager with the default dispatch thread.
    pub fn new() -> Result<Self> {
        Self::with_config(EventConfig::default())
    }

    pub fn with_config(config: EventConfig) -> Result<Self> {
        let worker = WorkerThread::spawn(config.dispatch_thread.clone())?;
        info!(worker = %config.dispatch_thread, "event dispatch thread started");
        Ok(Self {
            config,
            types: RwLock::new(HashMap::new()),
            worker,
        })
    }

    #[inline]
    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    /// Register `name`, or return the type already registered under it.
    ///
    /// Fails when a different name already owns the same hash.
    pub fn create_event_type(
        &self,
        name: &str,
    ) -> Result<Arc<EventType>> {
        let hash = hash_name(name);
        let mut types = self.types.write();
        if let Some(existing) = types.get(&hash) {
            if existing.name() != name {
                return Err(RuntimeError::EventTypeHashCollision {
                    name: name.to_string(),
                    existing: existing.name().to_string(),
                    hash,
                });
            }
            return Ok(Arc::clone(existing));
        }

        let event_type = Arc::new(EventType::new(name));
        types.insert(hash, Arc::clone(&event_type));
        debug!(event = %name, hash, "event type registered");
        Ok(event_type)
    }

    pub fn event_type(
        &self,
        name: &str,
    ) -> Option<Arc<EventType>> {
        self.event_type_by_hash(hash_name(name))
            .filter(|t| t.name() == name)
    }

    pub fn event_type_by_hash(
        &self,
        hash: u64,
    ) -> Option<Arc<EventType>> {
        self.types.read().get(&hash).cloned()
    }

    /// Unregister `name`. Holders of the type keep it alive.
    pub fn remove_event_type(
        &self,
        name: &str,
    ) -> Result<Arc<EventType>> {
        let hash = hash_name(name);
        let mut types = self.types.write();
        if types.get(&hash).is_some_and(|t| t.name() == name) {
            if let Some(removed) = types.remove(&hash) {
                debug!(event = %name, hash, "event type removed");
                return Ok(removed);
            }
        }
        Err(RuntimeError::UnknownEventType {
            name: name.to_string(),
            hash,
        })
    }

    /// Event type names, sorted.
    pub fn event_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .values()
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Attach a listener object to the type called `name`.
    pub fn add_listener(
        &self,
        name: &str,
        listener: Arc<dyn EventListener>,
    ) -> Result<Listener> {
        Ok(self.require(name)?.add_listener(listener))
    }

    /// Attach a callback to the type called `name`.
    pub fn add_callback<F>(
        &self,
        name: &str,
        callback: F,
    ) -> Result<Listener>
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        Ok(self.require(name)?.add_callback(callback))
    }

    /// Queue `event` for dispatch on the dispatch thread.
    ///
    /// The event is dropped once dispatch has run, consumed or not.
    pub fn push_event(
        &self,
        event: Event,
    ) -> Result<()> {
        let event_type = self.resolve(&event)?;
        let task = Task::once(format!("dispatch '{}'", event.name()), move |_| {
            event_type.dispatch(&event);
        });
        self.worker.try_add_task(task)
    }

    /// Dispatch `event` on the calling thread. Returns whether a listener
    /// consumed it.
    pub fn trigger_event(
        &self,
        event: &Event,
    ) -> Result<bool> {
        Ok(self.resolve(event)?.dispatch(event))
    }

    /// Handle of the dispatch worker.
    #[inline]
    pub fn dispatch_worker(&self) -> &WorkerHandle {
        self.worker.handle()
    }

    /// Stop the dispatch worker. Pending pushed events are dropped.
    pub fn shutdown(&self) {
        self.worker.exit_and_join();
    }

    fn require(
        &self,
        name: &str,
    ) -> Result<Arc<EventType>> {
        self.event_type(name)
            .ok_or_else(|| RuntimeError::UnknownEventType {
                name: name.to_string(),
                hash: hash_name(name),
            })
    }

    fn resolve(
        &self,
        event: &Event,
    ) -> Result<Arc<EventType>> {
        self.event_type_by_hash(event.hash())
            .ok_or_else(|| RuntimeError::UnknownEventType {
                name: event.name().to_string(),
                hash: event.hash(),
            })
    }
}
