//! One-shot restoration of a saved scroll position

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ScrollListenerNotifier;
use crate::error::ScrollError;

/// Saved list position: first visible content item and its pixel offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub position: usize,
    pub offset: i32,
}

/// Layout strategy of the observed list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Linear,
    Grid,
    Staggered,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayoutKind::Linear => "linear",
            LayoutKind::Grid => "grid",
            LayoutKind::Staggered => "staggered",
        };
        f.write_str(name)
    }
}

/// The list view a restorer drives
pub trait ScrollableList {
    fn layout_kind(&self) -> LayoutKind;

    /// Adapter position and top offset of the first visible item
    fn first_visible_item(&self) -> Option<(usize, i32)>;

    fn scroll_to_position_with_offset(&self, position: usize, offset: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RestoreState {
    Restorable(ScrollPosition),
    Consumed,
}

/// Restores a saved position at most once
pub struct ScrollRestorer {
    list: Rc<dyn ScrollableList>,
    notifier: Rc<ScrollListenerNotifier>,
    header_count: usize,
    state: RestoreState,
}

impl ScrollRestorer {
    /// Restorer for a saved position; `header_count` leading non-content
    /// items are skipped when jumping back.
    pub fn new(
        list: Rc<dyn ScrollableList>,
        notifier: Rc<ScrollListenerNotifier>,
        saved: ScrollPosition,
        header_count: usize,
    ) -> Self {
        Self {
            list,
            notifier,
            header_count,
            state: RestoreState::Restorable(saved),
        }
    }

    /// Restorer with nothing to restore
    pub fn non_restoring(
        list: Rc<dyn ScrollableList>,
        notifier: Rc<ScrollListenerNotifier>,
    ) -> Self {
        Self {
            list,
            notifier,
            header_count: 0,
            state: RestoreState::Consumed,
        }
    }

    /// Build from an optional saved position
    pub fn from_saved(
        list: Rc<dyn ScrollableList>,
        notifier: Rc<ScrollListenerNotifier>,
        saved: Option<ScrollPosition>,
        header_count: usize,
    ) -> Self {
        match saved {
            Some(saved) => Self::new(list, notifier, saved, header_count),
            None => Self::non_restoring(list, notifier),
        }
    }

    pub fn is_restorable(&self) -> bool {
        matches!(self.state, RestoreState::Restorable(_))
    }

    /// Jump to the saved position if it has not been used yet
    pub fn maybe_restore_scroll(&mut self) {
        let RestoreState::Restorable(saved) = self.state else {
            return;
        };
        debug!(
            position = saved.position,
            offset = saved.offset,
            "restoring scroll position"
        );
        self.list
            .scroll_to_position_with_offset(saved.position + self.header_count, saved.offset);
        self.notifier.on_programmatic_scroll();
        self.state = RestoreState::Consumed;
    }

    /// Give up on restoring, e.g. because the saved position is stale
    pub fn abandon_restoring_scroll(&mut self) {
        self.state = RestoreState::Consumed;
    }

    /// Capture the current position for persistence, relative to content.
    /// Returns `Ok(None)` when nothing or only header items are visible.
    pub fn scroll_state_for_restore(
        list: &dyn ScrollableList,
        header_count: usize,
    ) -> Result<Option<ScrollPosition>, ScrollError> {
        let kind = list.layout_kind();
        if kind != LayoutKind::Linear {
            return Err(ScrollError::NonLinearLayout(kind.to_string()));
        }
        let Some((position, offset)) = list.first_visible_item() else {
            return Ok(None);
        };
        Ok(position
            .checked_sub(header_count)
            .map(|position| ScrollPosition { position, offset }))
    }
}
