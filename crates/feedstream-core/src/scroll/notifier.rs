//! Bridge from a raw list scroll source to registered listeners

use std::cell::RefCell;
use std::rc::Rc;

use tracing::error;

use super::{ScrollListener, ScrollObservable, ScrollState};
use crate::constants::scroll::UNKNOWN_SCROLL_DELTA;
use crate::scheduler::{Clock, MainThreadRunner};

/// Notified when scrolling settles and visible content may have changed
pub trait ContentChangedListener {
    fn on_content_changed(&self);
}

struct NotifierState {
    listeners: Vec<Rc<dyn ScrollListener>>,
    current: ScrollState,
}

impl NotifierState {
    fn snapshot(&self) -> Vec<Rc<dyn ScrollListener>> {
        self.listeners.clone()
    }
}

/// Normalizes raw scroll callbacks and fans them out to listeners
pub struct ScrollListenerNotifier {
    state: Rc<RefCell<NotifierState>>,
    content_changed: Rc<dyn ContentChangedListener>,
    runner: Rc<dyn MainThreadRunner>,
    clock: Rc<dyn Clock>,
}

impl ScrollListenerNotifier {
    pub fn new(
        content_changed: Rc<dyn ContentChangedListener>,
        runner: Rc<dyn MainThreadRunner>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            state: Rc::new(RefCell::new(NotifierState {
                listeners: Vec::new(),
                current: ScrollState::Idle,
            })),
            content_changed,
            runner,
            clock,
        }
    }

    /// Handle a raw state change from the list host.
    /// Unknown values are logged and treated as idle.
    pub fn on_scroll_state_changed(&self, raw_state: i32) {
        let state = ScrollState::from_raw(raw_state).unwrap_or_else(|| {
            error!(raw_state, "unrecognized scroll state, treating as idle");
            ScrollState::Idle
        });

        if state == ScrollState::Idle {
            self.content_changed.on_content_changed();
        }

        let listeners = {
            let mut inner = self.state.borrow_mut();
            inner.current = state;
            inner.snapshot()
        };
        let timestamp = self.clock.now_millis();
        for listener in listeners {
            listener.on_scroll_state_changed(state, timestamp);
        }
    }

    /// Forward raw deltas to every listener; filtering happens downstream
    pub fn on_scroll(&self, dx: i32, dy: i32) {
        let listeners = self.state.borrow().snapshot();
        for listener in listeners {
            listener.on_scrolled(dx, dy);
        }
    }

    /// Tell listeners the list moved by an unknown amount, e.g. after a restore.
    /// Delivered on the next main-thread turn, never synchronously.
    pub fn on_programmatic_scroll(&self) {
        let state = Rc::downgrade(&self.state);
        self.runner.execute(
            "ScrollListenerNotifier programmatic scroll",
            Box::new(move || {
                let Some(state) = state.upgrade() else {
                    return;
                };
                let listeners = state.borrow().snapshot();
                for listener in listeners {
                    listener.on_scrolled(UNKNOWN_SCROLL_DELTA, UNKNOWN_SCROLL_DELTA);
                }
            }),
        );
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

impl ScrollObservable for ScrollListenerNotifier {
    fn add_scroll_listener(&self, listener: Rc<dyn ScrollListener>) {
        let mut inner = self.state.borrow_mut();
        if !inner.listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            inner.listeners.push(listener);
        }
    }

    fn remove_scroll_listener(&self, listener: &Rc<dyn ScrollListener>) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|l| !Rc::ptr_eq(l, listener));
    }

    fn current_scroll_state(&self) -> ScrollState {
        self.state.borrow().current
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::scheduler::ManualScheduler;

    #[derive(Default)]
    struct CountingContentListener {
        count: Cell<usize>,
    }

    impl ContentChangedListener for CountingContentListener {
        fn on_content_changed(&self) {
            self.count.set(self.count.get() + 1);
        }
    }

    #[derive(Default)]
    struct RecordingListener {
        states: RefCell<Vec<(ScrollState, u64)>>,
        scrolls: RefCell<Vec<(i32, i32)>>,
    }

    impl ScrollListener for RecordingListener {
        fn on_scroll_state_changed(&self, state: ScrollState, timestamp: u64) {
            self.states.borrow_mut().push((state, timestamp));
        }

        fn on_scrolled(&self, dx: i32, dy: i32) {
            self.scrolls.borrow_mut().push((dx, dy));
        }
    }

    fn setup() -> (
        Rc<ManualScheduler>,
        Rc<CountingContentListener>,
        ScrollListenerNotifier,
    ) {
        let scheduler = Rc::new(ManualScheduler::new(500));
        let content = Rc::new(CountingContentListener::default());
        let notifier =
            ScrollListenerNotifier::new(content.clone(), scheduler.clone(), scheduler.clone());
        (scheduler, content, notifier)
    }

    #[test]
    fn test_duplicate_registration_is_noop() {
        let (_scheduler, _content, notifier) = setup();
        let listener: Rc<dyn ScrollListener> = Rc::new(RecordingListener::default());

        notifier.add_scroll_listener(listener.clone());
        notifier.add_scroll_listener(listener.clone());
        assert_eq!(notifier.listener_count(), 1);

        notifier.remove_scroll_listener(&listener);
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_state_changes_are_normalized() {
        let (_scheduler, content, notifier) = setup();
        let listener = Rc::new(RecordingListener::default());
        notifier.add_scroll_listener(listener.clone());

        notifier.on_scroll_state_changed(1);
        notifier.on_scroll_state_changed(2);
        assert_eq!(content.count.get(), 0);
        assert_eq!(notifier.current_scroll_state(), ScrollState::Settling);

        notifier.on_scroll_state_changed(0);
        assert_eq!(content.count.get(), 1);
        assert_eq!(
            *listener.states.borrow(),
            vec![
                (ScrollState::Dragging, 500),
                (ScrollState::Settling, 500),
                (ScrollState::Idle, 500),
            ]
        );
    }

    #[test]
    fn test_unknown_state_falls_back_to_idle() {
        let (_scheduler, content, notifier) = setup();
        let listener = Rc::new(RecordingListener::default());
        notifier.add_scroll_listener(listener.clone());

        notifier.on_scroll_state_changed(1);
        notifier.on_scroll_state_changed(42);

        assert_eq!(notifier.current_scroll_state(), ScrollState::Idle);
        assert_eq!(content.count.get(), 1);
        assert_eq!(listener.states.borrow().last().unwrap().0, ScrollState::Idle);
    }

    #[test]
    fn test_scrolls_forwarded_unfiltered() {
        let (_scheduler, _content, notifier) = setup();
        let first = Rc::new(RecordingListener::default());
        let second = Rc::new(RecordingListener::default());
        notifier.add_scroll_listener(first.clone());
        notifier.add_scroll_listener(second.clone());

        notifier.on_scroll(3, 0);
        notifier.on_scroll(0, 1);

        assert_eq!(*first.scrolls.borrow(), vec![(3, 0), (0, 1)]);
        assert_eq!(*second.scrolls.borrow(), vec![(3, 0), (0, 1)]);
    }

    #[test]
    fn test_programmatic_scroll_is_deferred() {
        let (scheduler, _content, notifier) = setup();
        let listener = Rc::new(RecordingListener::default());
        notifier.add_scroll_listener(listener.clone());

        notifier.on_programmatic_scroll();
        assert!(listener.scrolls.borrow().is_empty());

        scheduler.run_until_idle();
        assert_eq!(
            *listener.scrolls.borrow(),
            vec![(UNKNOWN_SCROLL_DELTA, UNKNOWN_SCROLL_DELTA)]
        );
    }
}
