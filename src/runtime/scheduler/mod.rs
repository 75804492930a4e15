//! Cooperative task scheduler
//!
//! Tasks are run by named worker threads, one OS thread each. A worker invokes
//! every task once per round; a task either finishes (its children are
//! promoted for the next round), continues (it is requeued), or fails (it is
//! logged, removed, and its children are still promoted).
//!
//! # Example
//!
//! ```no_run
//! use taskloom::runtime::scheduler::{Task, TaskManager};
//!
//! let manager = TaskManager::new();
//! let worker = manager.create_thread("io").unwrap();
//! worker.add_delayed_task(Task::once("hello", |_| println!("hello")), 50);
//! ```

pub mod manager;
pub mod sync;
pub mod task;
pub mod worker;

pub use manager::TaskManager;
pub use sync::Condition;
pub use task::{
    FnOnceTask, PersistentTask, Task, TaskBody, TaskContext, TaskId, TaskState, TaskStatus,
    WaitTask,
};
pub use worker::{RoundReport, RunQueue, WorkerHandle, WorkerStats, WorkerThread};

use serde::{Deserialize, Serialize};

/// Scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Stack size of worker threads in bytes; the platform default when unset.
    #[serde(default)]
    pub stack_size: Option<usize>,
}

#[cfg(test)]
pub(crate) mod tests;
