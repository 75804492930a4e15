//! Named registry of worker threads and factory for built-in tasks.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use super::sync::Condition;
use super::task::{Task, TaskContext, TaskStatus};
use super::worker::WorkerThread;
use super::SchedulerConfig;
use crate::runtime::error::{Result, RuntimeError};

/// Creates, names and owns worker threads.
///
/// Dropping the manager exits and joins every worker it still owns.
pub struct TaskManager {
    config: SchedulerConfig,
    threads: RwLock<HashMap<String, Arc<WorkerThread>>>,
}

impl fmt::Debug for TaskManager {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TaskManager")
            .field("config", &self.config)
            .field("threads", &self.thread_names())
            .finish()
    }
}

impl TaskManager {
    /// Create a task manager with default config.
    #[inline]
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            threads: RwLock::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start a worker thread under `name`.
    pub fn create_thread(
        &self,
        name: &str,
    ) -> Result<Arc<WorkerThread>> {
        let mut threads = self.threads.write();
        if threads.contains_key(name) {
            return Err(RuntimeError::DuplicateThreadName(name.to_string()));
        }

        let thread = Arc::new(WorkerThread::spawn_with_stack(
            name,
            self.config.stack_size,
        )?);
        threads.insert(name.to_string(), Arc::clone(&thread));
        info!(worker = %name, "worker thread created");
        Ok(thread)
    }

    /// Look up a worker by name.
    pub fn get_thread(
        &self,
        name: &str,
    ) -> Option<Arc<WorkerThread>> {
        self.threads.read().get(name).cloned()
    }

    /// Unregister a worker, then exit and join it.
    pub fn remove_thread(
        &self,
        name: &str,
    ) -> Result<()> {
        let thread = self
            .threads
            .write()
            .remove(name)
            .ok_or_else(|| RuntimeError::UnknownThread(name.to_string()))?;
        thread.exit_and_join();
        debug!(worker = %name, "worker thread removed");
        Ok(())
    }

    /// Registered worker names, sorted.
    pub fn thread_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.threads.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.threads.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.threads.read().is_empty()
    }

    /// Exit and join every registered worker.
    pub fn shutdown(&self) {
        let threads: Vec<_> = self.threads.write().drain().collect();
        for (name, thread) in threads {
            thread.exit_and_join();
            debug!(worker = %name, "worker thread shut down");
        }
    }

    /// A task finishing once more than `duration_ms` have elapsed.
    #[inline]
    pub fn create_wait_task(
        &self,
        duration_ms: u64,
    ) -> Task {
        Task::wait(duration_ms)
    }

    /// A task running `action` once.
    pub fn create_task<F, R>(
        &self,
        name: &str,
        action: F,
    ) -> Task
    where
        F: FnOnce(&TaskContext<'_>) -> R + Send + 'static,
        R: Into<TaskStatus>,
    {
        Task::once(name, action)
    }

    /// A task calling `step(elapsed_ms)` every round until it reports finished.
    pub fn create_persistent_task<F, R>(
        &self,
        name: &str,
        step: F,
    ) -> Task
    where
        F: FnMut(&TaskContext<'_>, u64) -> R + Send + 'static,
        R: Into<TaskStatus>,
    {
        Task::persistent(name, step)
    }

    /// A shared mutex for state touched by several tasks.
    pub fn create_mutex<T>(
        &self,
        value: T,
    ) -> Arc<Mutex<T>> {
        Arc::new(Mutex::new(value))
    }

    /// A shared condition for tasks that block cooperatively.
    pub fn create_condition(&self) -> Arc<Condition> {
        Arc::new(Condition::new())
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
