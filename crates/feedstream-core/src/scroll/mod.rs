//! Scroll coalescing pipeline
//!
//! Raw scroll callbacks flow through:
//! - [`ScrollListenerNotifier`]: normalizes scroll state and fans out to listeners
//! - [`ScrollTracker`]: merges same-direction deltas inside the coalescing window
//! - [`ScrollLogger`]: drops negligible scrolls before they reach the sink
//! - [`ScrollRestorer`]: restores a saved position once

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::constants::scroll::{RAW_STATE_DRAGGING, RAW_STATE_IDLE, RAW_STATE_SETTLING};

mod logger;
mod notifier;
mod restorer;
mod tracker;

pub use logger::{
    ScrollLogger, ScrollLoggingSink, ScrollType, StreamScrollLogging, TracingScrollSink,
};
pub use notifier::{ContentChangedListener, ScrollListenerNotifier};
pub use restorer::{LayoutKind, ScrollPosition, ScrollRestorer, ScrollableList};
pub use tracker::{ScrollEventHandler, ScrollTracker};

/// Normalized scroll state of the observed list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollState {
    #[default]
    Idle,
    Dragging,
    Settling,
}

impl ScrollState {
    /// Map a raw host value; `None` for values the host should never send
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            RAW_STATE_IDLE => Some(Self::Idle),
            RAW_STATE_DRAGGING => Some(Self::Dragging),
            RAW_STATE_SETTLING => Some(Self::Settling),
            _ => None,
        }
    }
}

/// Receives normalized scroll state changes and raw deltas
pub trait ScrollListener {
    fn on_scroll_state_changed(&self, state: ScrollState, timestamp: u64);

    /// Raw deltas; both are [`UNKNOWN_SCROLL_DELTA`] for programmatic scrolls
    ///
    /// [`UNKNOWN_SCROLL_DELTA`]: crate::constants::scroll::UNKNOWN_SCROLL_DELTA
    fn on_scrolled(&self, dx: i32, dy: i32);
}

/// Something listeners can subscribe to for scroll callbacks
pub trait ScrollObservable {
    /// Register a listener; registering the same listener twice is a no-op
    fn add_scroll_listener(&self, listener: Rc<dyn ScrollListener>);

    fn remove_scroll_listener(&self, listener: &Rc<dyn ScrollListener>);

    /// Last normalized scroll state
    fn current_scroll_state(&self) -> ScrollState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(ScrollState::from_raw(0), Some(ScrollState::Idle));
        assert_eq!(ScrollState::from_raw(1), Some(ScrollState::Dragging));
        assert_eq!(ScrollState::from_raw(2), Some(ScrollState::Settling));
        assert_eq!(ScrollState::from_raw(7), None);
        assert_eq!(ScrollState::from_raw(-1), None);
    }
}
