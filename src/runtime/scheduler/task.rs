//! Task definitions for the scheduler.
//!
//! A [`Task`] is a co-owned handle to a unit of cooperative work. The worker
//! invokes it once per round with the milliseconds elapsed since its previous
//! invocation; the body answers with a [`TaskStatus`]. When a task finishes (or
//! fails) its children are promoted onto the same worker for the next round.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering},
    Arc,
};

use parking_lot::{Mutex, RwLock};

use super::worker::WorkerHandle;
use crate::runtime::timer::Timer;

/// Unique task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Allocate the next process-wide id.
    #[inline]
    fn next() -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
        TaskId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for its next invocation.
    Pending,
    /// Currently inside `run`.
    Running,
    /// Returned finished.
    Finished,
    /// Returned an error or panicked.
    Failed,
}

impl TaskState {
    /// Convert from u8 (for atomic storage).
    #[inline]
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => TaskState::Running,
            2 => TaskState::Finished,
            3 => TaskState::Failed,
            _ => TaskState::Pending,
        }
    }

    /// Convert to u8 (for atomic storage).
    #[inline]
    pub fn as_u8(&self) -> u8 {
        match self {
            TaskState::Pending => 0,
            TaskState::Running => 1,
            TaskState::Finished => 2,
            TaskState::Failed => 3,
        }
    }

    /// Whether the task will never run again.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Finished | TaskState::Failed)
    }
}

/// Outcome of one invocation of a task body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Remove the task and promote its children.
    Finished,
    /// Requeue the task for the next round.
    Continue,
    /// The task failed; it is removed and its children are still promoted.
    Failed(String),
}

impl TaskStatus {
    /// Build a failure from anything printable.
    pub fn failed(reason: impl fmt::Display) -> Self {
        TaskStatus::Failed(reason.to_string())
    }

    /// True for both `Finished` and `Failed`.
    #[inline]
    pub fn is_done(&self) -> bool {
        !matches!(self, TaskStatus::Continue)
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

impl From<bool> for TaskStatus {
    fn from(finished: bool) -> Self {
        if finished {
            TaskStatus::Finished
        } else {
            TaskStatus::Continue
        }
    }
}

impl From<()> for TaskStatus {
    fn from(_: ()) -> Self {
        TaskStatus::Finished
    }
}

impl<E: fmt::Display> From<Result<bool, E>> for TaskStatus {
    fn from(result: Result<bool, E>) -> Self {
        match result {
            Ok(finished) => finished.into(),
            Err(e) => TaskStatus::Failed(format!("{:#}", e)),
        }
    }
}

impl<E: fmt::Display> From<Result<(), E>> for TaskStatus {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => TaskStatus::Finished,
            Err(e) => TaskStatus::Failed(format!("{:#}", e)),
        }
    }
}

/// Context handed to a task body on every invocation.
///
/// Gives the body access to the task being run and, when the task runs on a
/// worker, to that worker so follow-up work can be scheduled on the same
/// thread without passing the handle around.
pub struct TaskContext<'a> {
    task: &'a Task,
    worker: Option<&'a WorkerHandle>,
}

impl<'a> TaskContext<'a> {
    pub(crate) fn new(
        task: &'a Task,
        worker: Option<&'a WorkerHandle>,
    ) -> Self {
        Self { task, worker }
    }

    /// The task currently being run.
    #[inline]
    pub fn task(&self) -> &Task {
        self.task
    }

    /// The worker executing this task, if any.
    #[inline]
    pub fn worker(&self) -> Option<&WorkerHandle> {
        self.worker
    }

    /// Schedule a task on the current worker. Returns `false` when the task is
    /// being driven by hand or the worker has stopped.
    pub fn spawn(
        &self,
        task: Task,
    ) -> bool {
        match self.worker {
            Some(worker) => worker.try_add_task(task).is_ok(),
            None => false,
        }
    }
}

impl fmt::Debug for TaskContext<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("task", &self.task.name())
            .field("worker", &self.worker.map(|w| w.name()))
            .finish()
    }
}

/// The run contract of a task.
pub trait TaskBody: Send {
    /// Invoked once per round with the milliseconds elapsed since the
    /// previous invocation (since creation on the first one).
    fn run(
        &mut self,
        ctx: &TaskContext<'_>,
        elapsed_ms: u64,
    ) -> TaskStatus;
}

/// Finishes once the accumulated elapsed time strictly exceeds its duration.
#[derive(Debug, Clone)]
pub struct WaitTask {
    duration_ms: u64,
    accumulated_ms: u64,
}

impl WaitTask {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            accumulated_ms: 0,
        }
    }

    /// Milliseconds accumulated so far.
    #[inline]
    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }
}

impl TaskBody for WaitTask {
    fn run(
        &mut self,
        _ctx: &TaskContext<'_>,
        elapsed_ms: u64,
    ) -> TaskStatus {
        self.accumulated_ms = self.accumulated_ms.saturating_add(elapsed_ms);
        (self.accumulated_ms > self.duration_ms).into()
    }
}

/// Runs an action once and finishes, whatever the action answers.
pub struct FnOnceTask<F> {
    action: Option<F>,
}

impl<F> FnOnceTask<F> {
    pub fn new(action: F) -> Self {
        Self {
            action: Some(action),
        }
    }
}

impl<F, R> TaskBody for FnOnceTask<F>
where
    F: FnOnce(&TaskContext<'_>) -> R + Send,
    R: Into<TaskStatus>,
{
    fn run(
        &mut self,
        ctx: &TaskContext<'_>,
        _elapsed_ms: u64,
    ) -> TaskStatus {
        let Some(action) = self.action.take() else {
            return TaskStatus::Finished;
        };
        match action(ctx).into() {
            TaskStatus::Continue => TaskStatus::Finished,
            status => status,
        }
    }
}

/// Calls a function every round until it reports finished.
pub struct PersistentTask<F> {
    step: F,
}

impl<F> PersistentTask<F> {
    pub fn new(step: F) -> Self {
        Self { step }
    }
}

impl<F, R> TaskBody for PersistentTask<F>
where
    F: FnMut(&TaskContext<'_>, u64) -> R + Send,
    R: Into<TaskStatus>,
{
    fn run(
        &mut self,
        ctx: &TaskContext<'_>,
        elapsed_ms: u64,
    ) -> TaskStatus {
        (self.step)(ctx, elapsed_ms).into()
    }
}

struct TaskInner {
    id: TaskId,
    name: RwLock<String>,
    state: AtomicU8,
    /// Held while a worker queue owns the task.
    queued: AtomicBool,
    runs: AtomicUsize,
    timer: Mutex<Timer>,
    children: Mutex<Vec<Task>>,
    body: Mutex<Box<dyn TaskBody>>,
}

/// A co-owned task handle.
///
/// Cloning the handle adds an owner; the task is released when the last
/// owner (the caller, a worker queue, or a parent's child list) drops it.
#[derive(Clone)]
pub struct Task {
    inner: Arc<TaskInner>,
}

impl fmt::Debug for Task {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.inner.id)
            .field("name", &*self.inner.name.read())
            .field("state", &self.state())
            .field("runs", &self.run_count())
            .field("children", &self.children_len())
            .finish()
    }
}

impl Task {
    /// Create a task from any body.
    pub fn new(
        name: impl Into<String>,
        body: impl TaskBody + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                id: TaskId::next(),
                name: RwLock::new(name.into()),
                state: AtomicU8::new(TaskState::Pending.as_u8()),
                queued: AtomicBool::new(false),
                runs: AtomicUsize::new(0),
                timer: Mutex::new(Timer::new()),
                children: Mutex::new(Vec::new()),
                body: Mutex::new(Box::new(body)),
            }),
        }
    }

    /// A task that finishes once more than `duration_ms` have elapsed.
    pub fn wait(duration_ms: u64) -> Self {
        Self::new("wait", WaitTask::new(duration_ms))
    }

    /// A task that runs `action` once.
    pub fn once<F, R>(
        name: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: FnOnce(&TaskContext<'_>) -> R + Send + 'static,
        R: Into<TaskStatus>,
    {
        Self::new(name, FnOnceTask::new(action))
    }

    /// A task that calls `step` with the elapsed time every round until it
    /// reports finished.
    pub fn persistent<F, R>(
        name: impl Into<String>,
        step: F,
    ) -> Self
    where
        F: FnMut(&TaskContext<'_>, u64) -> R + Send + 'static,
        R: Into<TaskStatus>,
    {
        Self::new(name, PersistentTask::new(step))
    }

    /// Get the task ID.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    /// Get the task name.
    pub fn name(&self) -> String {
        self.inner.name.read().clone()
    }

    pub fn set_name(
        &self,
        name: impl Into<String>,
    ) {
        *self.inner.name.write() = name.into();
    }

    /// Get the current state.
    #[inline]
    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    #[inline]
    fn set_state(
        &self,
        state: TaskState,
    ) {
        self.inner.state.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Number of times the body has been invoked.
    #[inline]
    pub fn run_count(&self) -> usize {
        self.inner.runs.load(Ordering::SeqCst)
    }

    /// Append a child, to be scheduled after this task finishes.
    pub fn add_child(
        &self,
        child: Task,
    ) {
        self.inner.children.lock().push(child);
    }

    /// Builder form of [`Task::add_child`].
    pub fn with_child(
        self,
        child: Task,
    ) -> Self {
        self.add_child(child);
        self
    }

    /// Number of children not yet promoted.
    pub fn children_len(&self) -> usize {
        self.inner.children.lock().len()
    }

    /// Detach the children, in insertion order.
    pub(crate) fn take_children(&self) -> Vec<Task> {
        std::mem::take(&mut *self.inner.children.lock())
    }

    /// Whether a worker queue currently holds the task.
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.inner.queued.load(Ordering::SeqCst)
    }

    /// Mark the task as held by a queue. Fails if another queue holds it.
    pub(crate) fn claim(&self) -> bool {
        self.inner
            .queued
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Give the task back once its queue lets go of it.
    pub(crate) fn release(&self) {
        self.inner.queued.store(false, Ordering::SeqCst);
    }

    /// Number of live handles to this task.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles point at the same task.
    #[inline]
    pub fn ptr_eq(
        &self,
        other: &Task,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Invoke the body once with an explicit elapsed time, outside any worker.
    ///
    /// Children are not promoted; this drives a single task by hand.
    pub fn run_detached(
        &self,
        elapsed_ms: u64,
    ) -> TaskStatus {
        let ctx = TaskContext::new(self, None);
        self.step(&ctx, elapsed_ms)
    }

    /// Invoke the body with the time elapsed on the task's own timer.
    pub(crate) fn tick(
        &self,
        worker: &WorkerHandle,
    ) -> TaskStatus {
        let elapsed_ms = self.inner.timer.lock().delta_ms();
        let ctx = TaskContext::new(self, Some(worker));
        self.step(&ctx, elapsed_ms)
    }

    fn step(
        &self,
        ctx: &TaskContext<'_>,
        elapsed_ms: u64,
    ) -> TaskStatus {
        self.set_state(TaskState::Running);
        self.inner.runs.fetch_add(1, Ordering::SeqCst);

        let status = {
            let mut body = self.inner.body.lock();
            panic::catch_unwind(AssertUnwindSafe(|| body.run(ctx, elapsed_ms)))
                .unwrap_or_else(|payload| TaskStatus::Failed(panic_message(payload.as_ref())))
        };

        self.set_state(match status {
            TaskStatus::Continue => TaskState::Pending,
            TaskStatus::Finished => TaskState::Finished,
            TaskStatus::Failed(_) => TaskState::Failed,
        });
        #[cfg(feature = "debug")]
        tracing::trace!(task = %self.name(), elapsed_ms, ?status, "task step");
        status
    }
}

/// Render a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
