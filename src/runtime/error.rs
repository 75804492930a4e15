//! Runtime errors
//!
//! Errors reported synchronously to the caller of a scheduler or event-bus
//! operation. Failures raised inside a running task never surface here; the
//! worker loop logs them and keeps going.

use thiserror::Error;

/// Errors produced by the task manager, worker threads and the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// A worker thread with this name is already registered.
    #[error("worker thread '{0}' already exists")]
    DuplicateThreadName(String),

    /// No worker thread is registered under this name.
    #[error("worker thread '{0}' not found")]
    UnknownThread(String),

    /// The event names a type that was never registered.
    #[error("unknown event type '{name}' ({hash:#018x})")]
    UnknownEventType { name: String, hash: u64 },

    /// Two different names hash to the same event type id.
    #[error("event type '{name}' collides with registered type '{existing}' ({hash:#018x})")]
    EventTypeHashCollision {
        name: String,
        existing: String,
        hash: u64,
    },

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread '{name}': {message}")]
    ThreadSpawn { name: String, message: String },

    /// The task is already held by a worker queue.
    #[error("task '{name}' is already queued")]
    TaskAlreadyQueued { name: String },

    /// The worker has exited and no longer accepts tasks.
    #[error("worker thread '{0}' has stopped")]
    WorkerStopped(String),
}

/// Result alias used across the runtime.
pub type Result<T> = std::result::Result<T, RuntimeError>;
