//! Tolerance-filtered scroll logging

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::tracker::ScrollEventHandler;
use crate::constants::scroll::SCROLL_TOLERANCE;

/// Which surface produced a scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollType {
    Unknown,
    StreamScroll,
}

/// Final destination for scroll metrics
pub trait ScrollLoggingSink {
    fn on_scroll(&self, scroll_type: ScrollType, scroll_amount: i32);
}

/// Sink that records scrolls as structured tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingScrollSink;

impl ScrollLoggingSink for TracingScrollSink {
    fn on_scroll(&self, scroll_type: ScrollType, scroll_amount: i32) {
        info!(?scroll_type, scroll_amount, "scroll");
    }
}

/// Drops negligible scrolls and forwards the rest to a sink
pub struct ScrollLogger {
    sink: Rc<dyn ScrollLoggingSink>,
    tolerance: i32,
}

impl ScrollLogger {
    pub fn new(sink: Rc<dyn ScrollLoggingSink>) -> Self {
        Self {
            sink,
            tolerance: SCROLL_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: i32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Forward `scroll_amount` unless `|scroll_amount| <= tolerance`
    pub fn handle_scroll(&self, scroll_type: ScrollType, scroll_amount: i32) {
        if scroll_amount.unsigned_abs() <= self.tolerance.unsigned_abs() {
            debug!(scroll_amount, "scroll within tolerance, not logging");
            return;
        }
        self.sink.on_scroll(scroll_type, scroll_amount);
    }
}

/// Logs coalesced stream scrolls
pub struct StreamScrollLogging {
    logger: ScrollLogger,
}

impl StreamScrollLogging {
    pub fn new(logger: ScrollLogger) -> Self {
        Self { logger }
    }
}

impl ScrollEventHandler for StreamScrollLogging {
    fn on_scroll_event(&self, scroll_amount: i32, _timestamp: u64) {
        self.logger.handle_scroll(ScrollType::StreamScroll, scroll_amount);
    }
}
