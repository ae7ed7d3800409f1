//! Time-windowed, direction-aware scroll coalescing

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;

use super::{ScrollListener, ScrollState};
use crate::constants::scroll::{COALESCE_WINDOW, UNKNOWN_SCROLL_DELTA};
use crate::scheduler::{Clock, MainThreadRunner, TaskHandle};

/// Receives coalesced scroll events
pub trait ScrollEventHandler {
    fn on_scroll_event(&self, scroll_amount: i32, timestamp: u64);
}

/// A scroll run waiting for its window to close
struct PendingScroll {
    id: u64,
    positive: bool,
    amount: i32,
    timestamp: u64,
    handle: TaskHandle,
}

#[derive(Default)]
struct TrackerState {
    pending: Option<PendingScroll>,
    next_id: u64,
}

/// Converts a storm of scroll deltas into infrequent scroll events
///
/// Consecutive same-direction vertical deltas are summed until no delta
/// arrives for the coalescing window; a direction flip starts a new run and
/// leaves the previous one to fire on its own.
pub struct ScrollTracker {
    state: Rc<RefCell<TrackerState>>,
    handler: Rc<dyn ScrollEventHandler>,
    runner: Rc<dyn MainThreadRunner>,
    clock: Rc<dyn Clock>,
    window: Duration,
}

impl ScrollTracker {
    pub fn new(
        runner: Rc<dyn MainThreadRunner>,
        clock: Rc<dyn Clock>,
        handler: Rc<dyn ScrollEventHandler>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(TrackerState::default())),
            handler,
            runner,
            clock,
            window: COALESCE_WINDOW,
        }
    }

    /// Override the coalescing window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Track a raw scroll delta. Horizontal-only scrolls are ignored.
    pub fn track_scroll(&self, _dx: i32, dy: i32) {
        if dy == 0 || dy == UNKNOWN_SCROLL_DELTA {
            return;
        }
        let positive = dy > 0;

        let (id, amount) = {
            let mut state = self.state.borrow_mut();
            let mut amount = dy;
            if let Some(previous) = state.pending.as_ref() {
                if !previous.handle.is_canceled() && previous.positive == positive {
                    previous.handle.cancel();
                    amount = amount.saturating_add(previous.amount);
                }
            }
            let id = state.next_id;
            state.next_id += 1;
            (id, amount)
        };

        let timestamp = self.clock.now_millis();
        let weak_state = Rc::downgrade(&self.state);
        let handler = self.handler.clone();
        let handle = self.runner.execute_with_delay(
            "ScrollTracker notify",
            self.window,
            Box::new(move || fire(&weak_state, handler.as_ref(), id, amount, timestamp)),
        );

        self.state.borrow_mut().pending = Some(PendingScroll {
            id,
            positive,
            amount,
            timestamp,
            handle,
        });
    }

    /// Flush the pending run immediately so nothing is dropped on teardown
    pub fn on_unbind(&self) {
        let pending = self.state.borrow_mut().pending.take();
        if let Some(pending) = pending {
            pending.handle.cancel();
            debug!(amount = pending.amount, "flushing pending scroll on unbind");
            self.handler.on_scroll_event(pending.amount, pending.timestamp);
        }
    }

    /// Whether a run is waiting for its window to close
    pub fn has_pending(&self) -> bool {
        self.state.borrow().pending.is_some()
    }
}

fn fire(
    state: &Weak<RefCell<TrackerState>>,
    handler: &dyn ScrollEventHandler,
    id: u64,
    amount: i32,
    timestamp: u64,
) {
    handler.on_scroll_event(amount, timestamp);
    if let Some(state) = state.upgrade() {
        let mut state = state.borrow_mut();
        // A newer run may have replaced this one while it waited
        if state.pending.as_ref().is_some_and(|p| p.id == id) {
            state.pending = None;
        }
    }
}

impl ScrollListener for ScrollTracker {
    fn on_scroll_state_changed(&self, _state: ScrollState, _timestamp: u64) {}

    fn on_scrolled(&self, dx: i32, dy: i32) {
        self.track_scroll(dx, dy);
    }
}
