//! Scheduler 单元测试
//!
//! 测试任务、轮次调度、工作线程和任务管理器

use std::time::{Duration, Instant};


/// Poll `condition` until it holds or `timeout` expires.
pub(crate) fn wait_until(
    timeout: Duration,
    mut condition: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
