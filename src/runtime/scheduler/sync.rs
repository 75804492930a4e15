//! Blocking primitives for tasks that wait outside the scheduler.
//!
//! Waiting on a [`Condition`] blocks the calling OS thread. Inside a task's
//! `run` that means the whole worker stalls until the condition fires.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A manual-reset condition: once signalled, every waiter is released until
/// [`Condition::reset`] is called.
#[derive(Debug, Default)]
pub struct Condition {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

impl Condition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release all current and future waiters.
    pub fn signal(&self) {
        *self.signalled.lock() = true;
        self.condvar.notify_all();
    }

    /// Re-arm the condition.
    pub fn reset(&self) {
        *self.signalled.lock() = false;
    }

    #[inline]
    pub fn is_signalled(&self) -> bool {
        *self.signalled.lock()
    }

    /// Block until signalled.
    pub fn wait(&self) {
        let mut signalled = self.signalled.lock();
        while !*signalled {
            self.condvar.wait(&mut signalled);
        }
    }

    /// Block until signalled or until `timeout_ms` elapse. Returns whether the
    /// condition was signalled.
    pub fn wait_timeout(
        &self,
        timeout_ms: u64,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut signalled = self.signalled.lock();
        while !*signalled {
            if self
                .condvar
                .wait_until(&mut signalled, deadline)
                .timed_out()
            {
                return *signalled;
            }
        }
        true
    }
}
