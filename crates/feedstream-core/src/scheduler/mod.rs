//! Main-thread scheduling primitives
//!
//! Everything in this crate runs on a single cooperative "main" context.
//! The only asynchronous primitive is a cancelable delayed task:
//! - [`MainThreadRunner`] posts tasks, optionally after a delay
//! - [`TaskHandle`] cancels a posted task before it runs
//! - [`Clock`] supplies millisecond timestamps

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

mod local;
mod manual;

pub use local::LocalTaskScheduler;
pub use manual::ManualScheduler;

/// A unit of work posted to the main context
pub type Task = Box<dyn FnOnce() + 'static>;

/// Millisecond time source
pub trait Clock {
    /// Current time in milliseconds
    fn now_millis(&self) -> u64;
}

/// Wall clock backed by chrono
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Posts tasks onto the main execution context
pub trait MainThreadRunner {
    /// Run `task` after `delay`. The returned handle cancels it.
    fn execute_with_delay(&self, name: &'static str, delay: Duration, task: Task) -> TaskHandle;

    /// Run `task` as soon as the main context is free (never synchronously)
    fn execute(&self, name: &'static str, task: Task) {
        self.execute_with_delay(name, Duration::ZERO, task);
    }
}

/// Cancellation handle for a posted task
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    canceled: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prevent the task from running. No effect once it has run.
    pub fn cancel(&self) {
        self.canceled.set(true);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.get()
    }
}
