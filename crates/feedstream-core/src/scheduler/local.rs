//! Real-time main-thread runner on a tokio `LocalSet`

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use super::{Clock, MainThreadRunner, Task, TaskHandle};

/// Runs posted tasks with `tokio::task::spawn_local`
///
/// Must be used from inside a [`tokio::task::LocalSet`]; posted tasks are
/// `!Send` and stay on the thread driving the set.
pub struct LocalTaskScheduler {
    started: Instant,
    origin_millis: u64,
}

impl LocalTaskScheduler {
    /// Create a runner whose clock reads `origin_millis` now
    pub fn new(origin_millis: u64) -> Self {
        Self {
            started: Instant::now(),
            origin_millis,
        }
    }
}

impl Clock for LocalTaskScheduler {
    fn now_millis(&self) -> u64 {
        self.origin_millis + self.started.elapsed().as_millis() as u64
    }
}

impl MainThreadRunner for LocalTaskScheduler {
    fn execute_with_delay(&self, name: &'static str, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let guard = handle.clone();
        tokio::task::spawn_local(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            if guard.is_canceled() {
                trace!(task = name, "skipping canceled task");
                return;
            }
            trace!(task = name, "running task");
            task();
        });
        handle
    }
}
