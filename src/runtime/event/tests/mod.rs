//! Event bus 单元测试


use crate::runtime::event::Event;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared log of listener labels, in call order.
pub(super) type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub(super) fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A callback that records `label` and returns `consume`.
pub(super) fn recording(
    log: &CallLog,
    label: &'static str,
    consume: bool,
) -> impl Fn(&Event) -> bool + Send + Sync + 'static {
    let log = Arc::clone(log);
    move |_| {
        log.lock().push(label);
        consume
    }
}
