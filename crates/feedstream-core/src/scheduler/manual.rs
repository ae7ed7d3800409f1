//! Deterministic main-thread runner with a manually advanced clock

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use tracing::trace;

use super::{Clock, MainThreadRunner, Task, TaskHandle};

struct Pending {
    name: &'static str,
    handle: TaskHandle,
    task: Task,
}

struct Inner {
    now: u64,
    next_seq: u64,
    /// Keyed by (due time, post order) so equal due times run FIFO
    queue: BTreeMap<(u64, u64), Pending>,
}

/// Single-threaded event loop driven by explicit clock advances
///
/// Used for trace replay and tests: nothing runs until [`advance`] or
/// [`run_until_idle`] is called, and tasks observe the clock at their due time.
///
/// [`advance`]: ManualScheduler::advance
/// [`run_until_idle`]: ManualScheduler::run_until_idle
pub struct ManualScheduler {
    inner: RefCell<Inner>,
}

impl ManualScheduler {
    /// Create a scheduler whose clock starts at `start_millis`
    pub fn new(start_millis: u64) -> Self {
        Self {
            inner: RefCell::new(Inner {
                now: start_millis,
                next_seq: 0,
                queue: BTreeMap::new(),
            }),
        }
    }

    /// Number of posted tasks that are neither run nor canceled
    pub fn pending_count(&self) -> usize {
        self.inner
            .borrow()
            .queue
            .values()
            .filter(|p| !p.handle.is_canceled())
            .count()
    }

    /// Move the clock forward by `by`, running every task that falls due.
    /// Returns how many tasks ran.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now_millis().saturating_add(by.as_millis() as u64);
        let ran = self.run_due(target);
        self.inner.borrow_mut().now = target;
        ran
    }

    /// Run tasks until the queue is empty, jumping the clock as needed
    pub fn run_until_idle(&self) -> usize {
        self.run_due(u64::MAX)
    }

    fn run_due(&self, deadline: u64) -> usize {
        let mut ran = 0;
        while let Some(pending) = self.pop_due(deadline) {
            if pending.handle.is_canceled() {
                trace!(task = pending.name, "skipping canceled task");
                continue;
            }
            trace!(task = pending.name, now = self.now_millis(), "running task");
            (pending.task)();
            ran += 1;
        }
        ran
    }

    /// Pop the earliest task due at or before `deadline`, advancing the clock to it.
    /// The borrow is released before the task runs so tasks may post more tasks.
    fn pop_due(&self, deadline: u64) -> Option<Pending> {
        let mut inner = self.inner.borrow_mut();
        let key = *inner.queue.keys().next()?;
        if key.0 > deadline {
            return None;
        }
        let pending = inner.queue.remove(&key)?;
        inner.now = inner.now.max(key.0);
        Some(pending)
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for ManualScheduler {
    fn now_millis(&self) -> u64 {
        self.inner.borrow().now
    }
}

impl MainThreadRunner for ManualScheduler {
    fn execute_with_delay(&self, name: &'static str, delay: Duration, task: Task) -> TaskHandle {
        let handle = TaskHandle::new();
        let mut inner = self.inner.borrow_mut();
        let due = inner.now.saturating_add(delay.as_millis() as u64);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.insert(
            (due, seq),
            Pending {
                name,
                handle: handle.clone(),
                task,
            },
        );
        handle
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_tasks_run_in_due_order() {
        let scheduler = ManualScheduler::new(1_000);
        let log = Rc::new(RefCell::new(Vec::new()));

        for (name, delay) in [("late", 300), ("early", 100), ("mid", 200)] {
            let log = log.clone();
            scheduler.execute_with_delay(
                "test",
                Duration::from_millis(delay),
                Box::new(move || log.borrow_mut().push(name)),
            );
        }

        assert_eq!(scheduler.advance(Duration::from_millis(150)), 1);
        assert_eq!(scheduler.now_millis(), 1_150);
        assert_eq!(scheduler.advance(Duration::from_millis(500)), 2);
        assert_eq!(*log.borrow(), vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_equal_due_times_run_in_post_order() {
        let scheduler = ManualScheduler::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = log.clone();
            scheduler.execute_with_delay(
                "test",
                Duration::from_millis(200),
                Box::new(move || log.borrow_mut().push(name)),
            );
        }
        // Posted later with a shorter delay, but due at the same time
        scheduler.advance(Duration::from_millis(100));
        let late = log.clone();
        scheduler.execute_with_delay(
            "test",
            Duration::from_millis(100),
            Box::new(move || late.borrow_mut().push("fourth")),
        );

        assert_eq!(scheduler.advance(Duration::from_millis(100)), 4);
        assert_eq!(*log.borrow(), vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn test_canceled_task_never_runs() {
        let scheduler = ManualScheduler::default();
        let ran = Rc::new(RefCell::new(false));
        let flag = ran.clone();

        let handle = scheduler.execute_with_delay(
            "test",
            Duration::from_millis(10),
            Box::new(move || *flag.borrow_mut() = true),
        );
        assert_eq!(scheduler.pending_count(), 1);
        handle.cancel();
        assert_eq!(scheduler.pending_count(), 0);

        assert_eq!(scheduler.run_until_idle(), 0);
        assert!(!*ran.borrow());
    }

    #[test]
    fn test_execute_is_deferred_and_tasks_can_post_tasks() {
        let scheduler = Rc::new(ManualScheduler::default());
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_log = log.clone();
        let inner_scheduler = scheduler.clone();
        scheduler.execute(
            "outer",
            Box::new(move || {
                inner_log.borrow_mut().push("outer");
                let nested_log = inner_log.clone();
                inner_scheduler.execute(
                    "nested",
                    Box::new(move || nested_log.borrow_mut().push("nested")),
                );
            }),
        );

        assert!(log.borrow().is_empty());
        assert_eq!(scheduler.run_until_idle(), 2);
        assert_eq!(*log.borrow(), vec!["outer", "nested"]);
    }

    #[test]
    fn test_task_sees_its_due_time() {
        let scheduler = Rc::new(ManualScheduler::new(0));
        let seen = Rc::new(RefCell::new(0));

        let clock = scheduler.clone();
        let out = seen.clone();
        scheduler.execute_with_delay(
            "test",
            Duration::from_millis(200),
            Box::new(move || *out.borrow_mut() = clock.now_millis()),
        );

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(*seen.borrow(), 200);
        assert_eq!(scheduler.now_millis(), 1_000);
    }
}
