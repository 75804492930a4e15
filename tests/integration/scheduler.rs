//! Scheduler 集成测试

use crate::wait_until;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use taskloom::runtime::scheduler::{SchedulerConfig, Task, TaskManager, TaskStatus};
use taskloom::RuntimeError;

#[test]
fn test_wait_then_child_runs_once_on_its_worker() {
    let manager = TaskManager::new();
    let t1 = manager.create_thread("t1").unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let child = {
        let seen = Arc::clone(&seen);
        Task::once("A", move |ctx| {
            let worker = ctx.worker().map(|w| w.name().to_string());
            seen.lock().push((worker, Instant::now()));
        })
    };
    let started = Instant::now();
    t1.add_task(manager.create_wait_task(50).with_child(child));

    assert!(wait_until(Duration::from_secs(5), || seen.lock().len() == 1));
    std::thread::sleep(Duration::from_millis(50));

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("t1"));
    assert!(seen[0].1.duration_since(started) >= Duration::from_millis(50));
}

#[test]
fn test_duplicate_thread_name_is_rejected() {
    let manager = TaskManager::new();
    manager.create_thread("x").unwrap();
    assert_eq!(
        manager.create_thread("x").unwrap_err(),
        RuntimeError::DuplicateThreadName("x".to_string())
    );
    assert_eq!(manager.len(), 1);
}

#[test]
fn test_anyhow_errors_fail_the_task_but_promote_children() {
    let manager = TaskManager::new();
    let worker = manager.create_thread("fallible").unwrap();
    let child_ran = Arc::new(AtomicUsize::new(0));

    let failing = manager.create_task("fallible-step", |_| -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    });
    let child = {
        let child_ran = Arc::clone(&child_ran);
        Task::once("cleanup", move |_| {
            child_ran.fetch_add(1, Ordering::SeqCst);
        })
    };
    worker.add_task(failing.with_child(child));

    assert!(wait_until(Duration::from_secs(5), || child_ran.load(Ordering::SeqCst) == 1));
    assert_eq!(worker.stats().tasks_failed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_tasks_spawned_from_tasks_stay_on_the_worker() {
    let manager = TaskManager::with_config(SchedulerConfig {
        stack_size: Some(256 * 1024),
    });
    let worker = manager.create_thread("spawner").unwrap();
    let names = Arc::new(Mutex::new(Vec::new()));

    let parent = {
        let names = Arc::clone(&names);
        manager.create_persistent_task("parent", move |ctx, _| {
            let count = ctx.task().run_count();
            let names = Arc::clone(&names);
            ctx.spawn(Task::once(format!("spawned-{}", count), move |_| {
                let thread = std::thread::current().name().map(str::to_string);
                names.lock().push(thread);
            }));
            if count == 3 {
                TaskStatus::Finished
            } else {
                TaskStatus::Continue
            }
        })
    };
    worker.add_task(parent);

    assert!(wait_until(Duration::from_secs(5), || names.lock().len() == 3));
    assert!(names
        .lock()
        .iter()
        .all(|n| n.as_deref() == Some("spawner")));
}

#[test]
fn test_condition_signalled_from_worker() {
    let manager = TaskManager::new();
    let worker = manager.create_thread("signaller").unwrap();
    let condition = manager.create_condition();

    let signal = Arc::clone(&condition);
    worker.add_delayed_task(Task::once("signal", move |_| signal.signal()), 20);

    assert!(condition.wait_timeout(5_000));
    assert!(condition.is_signalled());
}

#[test]
fn test_shared_mutex_across_workers() {
    let manager = TaskManager::new();
    let total = manager.create_mutex(0u64);

    for name in ["w0", "w1", "w2"] {
        let worker = manager.create_thread(name).unwrap();
        for _ in 0..10 {
            let total = Arc::clone(&total);
            worker.add_task(Task::once("inc", move |_| *total.lock() += 1));
        }
    }

    assert!(wait_until(Duration::from_secs(5), || *total.lock() == 30));
    manager.shutdown();
    assert!(manager.is_empty());
}

#[test]
fn test_delayed_task_fires_on_a_busy_worker() {
    let manager = TaskManager::new();
    let worker = manager.create_thread("busy").unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    worker.add_task(manager.create_persistent_task("spinner", |_, _| false));

    let started = Instant::now();
    let f = Arc::clone(&fired);
    worker.add_delayed_task(
        Task::once("late", move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        }),
        30,
    );

    assert!(wait_until(Duration::from_secs(5), || fired.load(Ordering::SeqCst) == 1));
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[test]
fn test_same_task_rejected_by_second_worker() {
    let manager = TaskManager::new();
    let a = manager.create_thread("a").unwrap();
    let b = manager.create_thread("b").unwrap();
    a.suspend();
    let task = manager.create_persistent_task("pinned", |_, _| false);
    a.try_add_task(task.clone()).unwrap();

    assert_eq!(
        b.try_add_task(task.clone()),
        Err(RuntimeError::TaskAlreadyQueued {
            name: "pinned".to_string()
        })
    );
}
