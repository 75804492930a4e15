//! Worker threads and the cooperative round loop.
//!
//! Each worker owns a single-consumer channel. Producers on any thread push
//! tasks into it; the worker drains it without blocking at the start of every
//! round, so a task added while a round is in flight is first run in the next
//! round. Unfinished tasks and the children of finished tasks are carried over
//! to the next round in the order they were produced.
//!
//! ```text
//!  add_task ──► channel ──drain──► [ round k ] ──continue/children──► [ round k+1 ]
//!                                      │
//!                                      └── finished / failed ──► released
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::task::{Task, TaskStatus};
use crate::runtime::error::{Result, RuntimeError};

/// Messages accepted by a worker.
enum Message {
    Task(Task),
    /// Re-evaluate suspension and shutdown flags.
    Wake,
}

/// Worker statistics.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Tasks accepted through `add_task`.
    pub tasks_added: AtomicUsize,
    /// Tasks that returned finished.
    pub tasks_finished: AtomicUsize,
    /// Tasks that failed or panicked.
    pub tasks_failed: AtomicUsize,
    /// Children promoted from finished or failed parents.
    pub children_promoted: AtomicUsize,
}

impl WorkerStats {
    #[inline]
    fn record_added(&self) {
        self.tasks_added.fetch_add(1, Ordering::SeqCst);
    }

    #[inline]
    fn record_round(
        &self,
        report: &RoundReport,
    ) {
        self.tasks_finished
            .fetch_add(report.finished, Ordering::SeqCst);
        self.tasks_failed.fetch_add(report.failed, Ordering::SeqCst);
        self.children_promoted
            .fetch_add(report.promoted, Ordering::SeqCst);
    }
}

/// Summary of one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Tasks invoked this round.
    pub ran: usize,
    /// Tasks that finished.
    pub finished: usize,
    /// Tasks that failed.
    pub failed: usize,
    /// Tasks carried over unfinished.
    pub requeued: usize,
    /// Children promoted for the next round.
    pub promoted: usize,
}

struct Shared {
    name: String,
    sender: Sender<Message>,
    suspended: AtomicBool,
    finished: AtomicBool,
    running: AtomicBool,
    rounds: AtomicU64,
    stats: WorkerStats,
}

/// Cloneable handle used to feed and control a worker from any thread.
#[derive(Clone)]
pub struct WorkerHandle {
    shared: Arc<Shared>,
}

impl fmt::Debug for WorkerHandle {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.shared.name)
            .field("suspended", &self.is_suspended())
            .field("finished", &self.is_finished())
            .field("rounds", &self.rounds())
            .finish()
    }
}

impl WorkerHandle {
    /// Worker name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Queue a task for the next round.
    pub fn try_add_task(
        &self,
        task: Task,
    ) -> Result<()> {
        if self.is_finished() {
            return Err(RuntimeError::WorkerStopped(self.shared.name.clone()));
        }
        if !task.claim() {
            return Err(RuntimeError::TaskAlreadyQueued { name: task.name() });
        }
        if let Err(channel::SendError(message)) = self.shared.sender.send(Message::Task(task)) {
            if let Message::Task(task) = message {
                task.release();
            }
            return Err(RuntimeError::WorkerStopped(self.shared.name.clone()));
        }
        self.shared.stats.record_added();
        Ok(())
    }

    /// Queue a task for the next round. A stopped worker drops the task, and
    /// a task already held by a queue is not queued again.
    pub fn add_task(
        &self,
        task: Task,
    ) {
        let name = task.name();
        if let Err(e) = self.try_add_task(task) {
            warn!(worker = %self.shared.name, task = %name, "{}; task dropped", e);
        }
    }

    /// Run `task` once more than `delay_ms` milliseconds have elapsed.
    pub fn add_delayed_task(
        &self,
        task: Task,
        delay_ms: u64,
    ) {
        self.add_task(Task::wait(delay_ms).with_child(task));
    }

    /// Stop starting new rounds. Queued tasks are kept.
    pub fn suspend(&self) {
        self.shared.suspended.store(true, Ordering::SeqCst);
    }

    /// Resume rounds after [`WorkerHandle::suspend`].
    pub fn resume(&self) {
        self.shared.suspended.store(false, Ordering::SeqCst);
        self.wake();
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.shared.suspended.load(Ordering::SeqCst)
    }

    /// Whether shutdown has been requested.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::SeqCst)
    }

    /// Whether the worker loop is still alive.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Number of completed rounds.
    #[inline]
    pub fn rounds(&self) -> u64 {
        self.shared.rounds.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn stats(&self) -> &WorkerStats {
        &self.shared.stats
    }

    fn wake(&self) {
        // Ignored once the loop is gone.
        let _ = self.shared.sender.send(Message::Wake);
    }

    fn request_exit(&self) {
        self.shared.finished.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// The task list of a worker and the round logic driving it.
///
/// [`WorkerThread`] runs one of these on its own OS thread. It can also be
/// driven round by round from the calling thread.
pub struct RunQueue {
    handle: WorkerHandle,
    receiver: Receiver<Message>,
    active: Vec<Task>,
}

impl fmt::Debug for RunQueue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("RunQueue")
            .field("name", &self.handle.name())
            .field("active", &self.active.len())
            .field("queued", &self.receiver.len())
            .finish()
    }
}

impl RunQueue {
    /// Create an empty queue.
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, receiver) = channel::unbounded();
        let shared = Arc::new(Shared {
            name: name.into(),
            sender,
            suspended: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            running: AtomicBool::new(false),
            rounds: AtomicU64::new(0),
            stats: WorkerStats::default(),
        });
        Self {
            handle: WorkerHandle { shared },
            receiver,
            active: Vec::new(),
        }
    }

    #[inline]
    pub fn handle(&self) -> &WorkerHandle {
        &self.handle
    }

    /// Number of tasks that would take part in the next round.
    pub fn pending(&mut self) -> usize {
        self.drain();
        self.active.len()
    }

    fn accept(
        &mut self,
        message: Message,
    ) {
        if let Message::Task(task) = message {
            self.active.push(task);
        }
    }

    /// Move everything already queued into the active list without blocking.
    /// Returns false once every handle is gone.
    fn drain(&mut self) -> bool {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => self.accept(message),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Run every task of the current round exactly once.
    ///
    /// Tasks queued before the call take part in this round; tasks queued
    /// during it wait for the next one.
    pub fn run_round(&mut self) -> RoundReport {
        self.drain();

        let current = std::mem::take(&mut self.active);
        let mut next = Vec::with_capacity(current.len());
        let mut report = RoundReport::default();

        for task in current {
            report.ran += 1;
            match task.tick(&self.handle) {
                TaskStatus::Continue => {
                    report.requeued += 1;
                    next.push(task);
                }
                status => {
                    if let TaskStatus::Failed(reason) = &status {
                        let name = task.name();
                        error!(
                            worker = %self.handle.name(),
                            task = %name,
                            "exception in task '{}': {}",
                            name,
                            reason
                        );
                        report.failed += 1;
                    } else {
                        report.finished += 1;
                    }
                    task.release();
                    for child in task.take_children() {
                        if child.claim() {
                            report.promoted += 1;
                            next.push(child);
                        } else {
                            warn!(
                                worker = %self.handle.name(),
                                task = %child.name(),
                                "child task is already queued; not promoted"
                            );
                        }
                    }
                }
            }
        }

        self.active = next;
        self.handle.shared.rounds.fetch_add(1, Ordering::SeqCst);
        self.handle.shared.stats.record_round(&report);
        report
    }

    /// Block in rounds until shutdown is requested.
    fn run_loop(&mut self) {
        let shared = Arc::clone(&self.handle.shared);
        debug!(worker = %shared.name, "worker started");

        loop {
            if shared.finished.load(Ordering::SeqCst) {
                break;
            }
            if !self.drain() {
                break;
            }
            if self.active.is_empty() || shared.suspended.load(Ordering::SeqCst) {
                match self.receiver.recv() {
                    Ok(message) => self.accept(message),
                    Err(_) => break,
                }
                continue;
            }
            self.run_round();
            thread::yield_now();
        }

        let dropped = self.pending();
        for task in self.active.drain(..) {
            task.release();
        }
        debug!(worker = %shared.name, dropped, "worker stopped");
    }
}

impl Drop for RunQueue {
    fn drop(&mut self) {
        self.drain();
        for task in self.active.drain(..) {
            task.release();
        }
    }
}

/// A named OS thread running the cooperative round loop.
///
/// Dereferences to its [`WorkerHandle`], so tasks can be added directly.
pub struct WorkerThread {
    handle: WorkerHandle,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for WorkerThread {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("WorkerThread")
            .field("handle", &self.handle)
            .finish()
    }
}

impl WorkerThread {
    /// Start a worker with the default stack size.
    pub fn spawn(name: impl Into<String>) -> Result<Self> {
        Self::spawn_with_stack(name, None)
    }

    /// Start a worker, optionally with an explicit stack size in bytes.
    pub fn spawn_with_stack(
        name: impl Into<String>,
        stack_size: Option<usize>,
    ) -> Result<Self> {
        let name = name.into();
        let mut queue = RunQueue::new(name.clone());
        let handle = queue.handle().clone();
        handle.shared.running.store(true, Ordering::SeqCst);

        let mut builder = thread::Builder::new().name(name.clone());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }

        let shared = Arc::clone(&handle.shared);
        let join = builder
            .spawn(move || {
                queue.run_loop();
                shared.running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                handle.shared.running.store(false, Ordering::SeqCst);
                RuntimeError::ThreadSpawn {
                    name: name.clone(),
                    message: e.to_string(),
                }
            })?;

        Ok(Self {
            handle,
            join: Mutex::new(Some(join)),
        })
    }

    #[inline]
    pub fn handle(&self) -> &WorkerHandle {
        &self.handle
    }

    /// Request shutdown and wait for the thread to end. Tasks still queued are
    /// dropped without running. Safe to call more than once.
    pub fn exit_and_join(&self) {
        self.handle.request_exit();

        let Some(join) = self.join.lock().take() else {
            return;
        };
        if join.thread().id() == thread::current().id() {
            // Called from one of our own tasks: the loop exits after this round.
            warn!(worker = %self.handle.name(), "exit_and_join called from the worker itself; not joining");
            return;
        }
        if join.join().is_err() {
            error!(worker = %self.handle.name(), "worker thread panicked");
        }
    }
}

impl Deref for WorkerThread {
    type Target = WorkerHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.exit_and_join();
    }
}
