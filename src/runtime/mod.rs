//! Runtime system
//!
//! The cooperative task scheduler, the event bus layered on it, and the
//! dynamic values carried by events.

pub mod error;
pub mod event;
pub mod scheduler;
pub mod timer;
pub mod value;

pub use error::{Result, RuntimeError};
pub use event::{Event, EventManager, EventType, Listener};
pub use scheduler::{Task, TaskManager, TaskStatus, WorkerThread};
pub use value::Value;

use std::fmt;

use crate::util::config::RuntimeConfig;

/// A task manager and an event manager built from one configuration.
pub struct Runtime {
    config: RuntimeConfig,
    tasks: TaskManager,
    events: EventManager,
}

impl fmt::Debug for Runtime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("threads", &self.tasks.thread_names())
            .field("events", &self.events)
            .finish()
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let tasks = TaskManager::with_config(config.scheduler.clone());
        let events = EventManager::with_config(config.events.clone())?;
        Ok(Self {
            config,
            tasks,
            events,
        })
    }

    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[inline]
    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    #[inline]
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Stop the dispatch worker, then every task worker.
    pub fn shutdown(&self) {
        self.events.shutdown();
        self.tasks.shutdown();
    }
}
