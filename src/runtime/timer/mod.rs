//! Monotonic stopwatch
//!
//! Every task owns one of these. The worker loop asks it for the time elapsed
//! since the previous query and hands that budget to the task's `run`.

use std::time::{Duration, Instant};

/// Monotonic stopwatch measuring milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    /// Creation instant.
    created: Instant,
    /// Instant of the last `delta_ms` query.
    last: Instant,
}

impl Timer {
    /// Start a new timer.
    #[inline]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            created: now,
            last: now,
        }
    }

    /// Whole milliseconds elapsed since the previous call (or since creation
    /// on the first call). The reference point advances by exactly the
    /// reported amount, so the sub-millisecond remainder carries over and the
    /// deltas add up to the real elapsed time.
    pub fn delta_ms(&mut self) -> u64 {
        let delta = Instant::now().saturating_duration_since(self.last);
        let ms = duration_to_ms(delta);
        self.last += Duration::from_millis(ms);
        ms
    }

    /// Milliseconds elapsed since the previous `delta_ms` call, without
    /// advancing the reference point.
    #[inline]
    pub fn peek_ms(&self) -> u64 {
        duration_to_ms(self.last.elapsed())
    }

    /// Milliseconds elapsed since creation.
    #[inline]
    pub fn total_ms(&self) -> u64 {
        duration_to_ms(self.created.elapsed())
    }

    /// Restart both reference points.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests;
