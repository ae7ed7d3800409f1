//! Scroll trace replay
//!
//! A trace is a JSON array of events:
//!
//! ```json
//! [
//!   { "type": "state", "value": 1 },
//!   { "type": "scroll", "dx": 0, "dy": 15 },
//!   { "type": "wait", "ms": 50 },
//!   { "type": "unbind" }
//! ]
//! ```

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use feedstream_core::config::ScrollConfig;
use feedstream_core::scheduler::{Clock, LocalTaskScheduler, MainThreadRunner, ManualScheduler};
use feedstream_core::scroll::{
    ContentChangedListener, ScrollListener, ScrollListenerNotifier, ScrollLogger,
    ScrollLoggingSink, ScrollObservable, ScrollTracker, ScrollType, StreamScrollLogging,
    TracingScrollSink,
};

/// One recorded input to the scroll pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    Scroll { dx: i32, dy: i32 },
    State { value: i32 },
    Wait { ms: u64 },
    Unbind,
}

/// A scroll that made it through the logger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedScroll {
    pub scroll_type: ScrollType,
    pub amount: i32,
    pub at_millis: u64,
}

/// Everything the pipeline produced for one trace
#[derive(Debug, Default, Serialize)]
pub struct ReplayReport {
    pub scrolls: Vec<LoggedScroll>,
    pub content_changed: usize,
}

pub fn load_trace(path: &Path) -> Result<Vec<TraceEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid trace {}", path.display()))
}

/// Records logged scrolls and forwards them to the tracing sink
struct RecordingSink {
    clock: Rc<dyn Clock>,
    scrolls: RefCell<Vec<LoggedScroll>>,
}

impl ScrollLoggingSink for RecordingSink {
    fn on_scroll(&self, scroll_type: ScrollType, scroll_amount: i32) {
        TracingScrollSink.on_scroll(scroll_type, scroll_amount);
        self.scrolls.borrow_mut().push(LoggedScroll {
            scroll_type,
            amount: scroll_amount,
            at_millis: self.clock.now_millis(),
        });
    }
}

#[derive(Default)]
struct ContentChangedCounter(Cell<usize>);

impl ContentChangedListener for ContentChangedCounter {
    fn on_content_changed(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// notifier -> tracker -> logger -> sink
struct Pipeline {
    notifier: ScrollListenerNotifier,
    tracker: Rc<ScrollTracker>,
    sink: Rc<RecordingSink>,
    content_changed: Rc<ContentChangedCounter>,
}

impl Pipeline {
    fn new(runner: Rc<dyn MainThreadRunner>, clock: Rc<dyn Clock>, config: &ScrollConfig) -> Self {
        let sink = Rc::new(RecordingSink {
            clock: clock.clone(),
            scrolls: RefCell::new(Vec::new()),
        });
        let logger = ScrollLogger::new(sink.clone()).with_tolerance(config.tolerance);
        let tracker = Rc::new(
            ScrollTracker::new(
                runner.clone(),
                clock.clone(),
                Rc::new(StreamScrollLogging::new(logger)),
            )
            .with_window(config.coalesce_window()),
        );

        let content_changed = Rc::new(ContentChangedCounter::default());
        let notifier = ScrollListenerNotifier::new(content_changed.clone(), runner, clock);
        let listener: Rc<dyn ScrollListener> = tracker.clone();
        notifier.add_scroll_listener(listener);

        Self {
            notifier,
            tracker,
            sink,
            content_changed,
        }
    }

    /// Feed one event; returns the delay the caller must let elapse
    fn feed(&self, event: &TraceEvent) -> Option<Duration> {
        match *event {
            TraceEvent::Scroll { dx, dy } => self.notifier.on_scroll(dx, dy),
            TraceEvent::State { value } => self.notifier.on_scroll_state_changed(value),
            TraceEvent::Wait { ms } => return Some(Duration::from_millis(ms)),
            TraceEvent::Unbind => self.tracker.on_unbind(),
        }
        None
    }

    fn report(&self) -> ReplayReport {
        ReplayReport {
            scrolls: self.sink.scrolls.borrow().clone(),
            content_changed: self.content_changed.0.get(),
        }
    }
}

/// Replay on a manual clock starting at zero; runs to completion instantly
pub fn replay(events: &[TraceEvent], config: &ScrollConfig) -> ReplayReport {
    let scheduler = Rc::new(ManualScheduler::new(0));
    let pipeline = Pipeline::new(scheduler.clone(), scheduler.clone(), config);

    for event in events {
        if let Some(delay) = pipeline.feed(event) {
            scheduler.advance(delay);
        }
    }
    scheduler.run_until_idle();
    pipeline.report()
}

/// Replay in wall-clock time on the current tokio `LocalSet`
pub async fn replay_realtime(events: &[TraceEvent], config: &ScrollConfig) -> ReplayReport {
    let scheduler = Rc::new(LocalTaskScheduler::new(0));
    let pipeline = Pipeline::new(scheduler.clone(), scheduler.clone(), config);

    for event in events {
        match pipeline.feed(event) {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }
    // Let the last coalescing window expire
    tokio::time::sleep(config.coalesce_window() + Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    pipeline.report()
}
