//! Capability boundary between the composer core and the concrete text input.
//!
//! The composer owns the draft text; the widget only renders it and reports
//! edits. The composer drives focus and selection through [`InputWidget`].

use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;

/// Byte offsets into the draft text. `start == end` is a caret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Caret position used for trigger detection (the active end of the selection).
    pub fn cursor(self) -> usize {
        self.end
    }

    pub fn fits_within(self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}

pub trait InputWidget {
    fn focus(&mut self);
    fn blur(&mut self);
    fn selection(&self) -> SelectionRange;
    /// Select everything the widget currently displays.
    fn select_all(&mut self);
}

/// Calls observed by [`RecordingWidget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetCall {
    Focus,
    Blur,
    SelectAll,
}

#[derive(Debug, Default)]
struct RecordingWidgetState {
    calls: Vec<WidgetCall>,
    selection: SelectionRange,
}

/// Headless widget that records every call; used by the replay binary and tests.
///
/// Clones share state, so a host can keep one handle for inspection while the
/// composer owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingWidget {
    state: Rc<RefCell<RecordingWidgetState>>,
}

impl RecordingWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the calls recorded so far.
    pub fn take_calls(&self) -> Vec<WidgetCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    pub fn set_selection(&self, selection: SelectionRange) {
        self.state.borrow_mut().selection = selection;
    }
}

impl InputWidget for RecordingWidget {
    fn focus(&mut self) {
        self.state.borrow_mut().calls.push(WidgetCall::Focus);
    }

    fn blur(&mut self) {
        self.state.borrow_mut().calls.push(WidgetCall::Blur);
    }

    fn selection(&self) -> SelectionRange {
        self.state.borrow().selection
    }

    fn select_all(&mut self) {
        self.state.borrow_mut().calls.push(WidgetCall::SelectAll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn selection_bounds() {
        assert!(SelectionRange::new(0, 3).fits_within(3));
        assert!(SelectionRange::caret(0).fits_within(0));
        assert!(!SelectionRange::new(2, 4).fits_within(3));
        assert!(!SelectionRange::new(3, 1).fits_within(5));
    }

    #[test]
    fn recording_widget_clones_share_state() {
        let handle = RecordingWidget::new();
        let mut owned = handle.clone();
        owned.focus();
        owned.select_all();
        handle.set_selection(SelectionRange::caret(2));

        assert_eq!(owned.selection(), SelectionRange::caret(2));
        assert_eq!(
            handle.take_calls(),
            vec![WidgetCall::Focus, WidgetCall::SelectAll]
        );
        assert!(handle.take_calls().is_empty());
    }
}
