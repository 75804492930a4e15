//! Runtime 启动测试

use std::io::Write;
use taskloom::util::logger::LogLevel;
use taskloom::{Event, RuntimeConfig, Task};

#[test]
fn test_start_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[log]\nlevel = \"warn\"\n\n[events]\ndispatch_thread = \"bus\""
    )
    .unwrap();

    let runtime = taskloom::start_from_file(file.path()).unwrap();
    assert_eq!(runtime.config().events.dispatch_thread, "bus");
    assert_eq!(runtime.events().dispatch_worker().name(), "bus");
    if std::env::var(taskloom::util::config::LOG_ENV).is_err() {
        assert_eq!(runtime.config().log.level, LogLevel::Warn);
    }
    runtime.shutdown();
}

#[test]
fn test_start_rejects_broken_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[log\nlevel = ").unwrap();

    let err = taskloom::start_from_file(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("Failed to load config"));
}

#[test]
fn test_runtime_wires_tasks_and_events() {
    let runtime = taskloom::start(RuntimeConfig::default()).unwrap();
    let worker = runtime.tasks().create_thread("producer").unwrap();
    runtime.events().create_event_type("done").unwrap();
    let (sender, receiver) = crossbeam::channel::bounded(1);
    runtime
        .events()
        .add_callback("done", move |_| sender.try_send(()).is_ok())
        .unwrap();

    let events = std::sync::Arc::new(runtime);
    let bus = std::sync::Arc::clone(&events);
    worker.add_task(Task::once("announce", move |_| {
        bus.events().push_event(Event::new("done"))
    }));

    receiver
        .recv_timeout(std::time::Duration::from_secs(5))
        .unwrap();
}
