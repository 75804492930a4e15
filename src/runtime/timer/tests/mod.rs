//! Timer 单元测试

use crate::runtime::timer::Timer;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_timer_starts_near_zero() {
    let timer = Timer::new();
    assert!(timer.total_ms() < 1000);
    assert!(timer.peek_ms() < 1000);
}

#[test]
fn test_delta_advances_reference_point() {
    let mut timer = Timer::new();
    thread::sleep(Duration::from_millis(20));
    let first = timer.delta_ms();
    assert!(first >= 20);

    // Immediately after a query the delta restarts from zero.
    let second = timer.delta_ms();
    assert!(second < first);
}

#[test]
fn test_total_is_monotonic_across_deltas() {
    let mut timer = Timer::new();
    thread::sleep(Duration::from_millis(10));
    let _ = timer.delta_ms();
    thread::sleep(Duration::from_millis(10));
    let _ = timer.delta_ms();
    assert!(timer.total_ms() >= 20);
}

#[test]
fn test_peek_does_not_consume() {
    let mut timer = Timer::new();
    thread::sleep(Duration::from_millis(15));
    let peeked = timer.peek_ms();
    let delta = timer.delta_ms();
    assert!(peeked >= 15);
    assert!(delta >= peeked);
}

#[test]
fn test_reset() {
    let mut timer = Timer::new();
    thread::sleep(Duration::from_millis(15));
    timer.reset();
    assert!(timer.total_ms() < 15);
}

#[test]
fn test_frequent_deltas_add_up_to_elapsed_time() {
    let mut timer = Timer::new();
    let started = Instant::now();
    let mut summed = 0u64;
    while started.elapsed() < Duration::from_millis(100) {
        summed += timer.delta_ms();
        thread::sleep(Duration::from_micros(150));
    }
    let real = started.elapsed().as_millis() as u64;

    // Only the remainder still pending on the timer is missing.
    assert!(summed + 1 >= real.saturating_sub(1), "summed {summed}ms of {real}ms");
    assert!(summed <= real);
}

#[test]
fn test_sub_millisecond_deltas_are_not_lost() {
    let mut timer = Timer::new();
    let mut summed = 0u64;
    for _ in 0..40 {
        thread::sleep(Duration::from_micros(500));
        summed += timer.delta_ms();
    }
    // 40 sleeps of at least 0.5 ms each.
    assert!(summed >= 19, "summed {summed}ms");
}
