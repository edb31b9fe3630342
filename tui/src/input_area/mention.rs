//! Mention trigger tracking for the `@user` and `#channel` autocomplete popups.
//!
//! The controller owns the caret selection, the two popup flags, the current
//! filter text for each popup, and the pick counter. It does not know which
//! candidate the popup highlights: pressing Enter while a popup is open only
//! bumps [`MentionController::pick_selected_counter`], and the popup view
//! commits its highlighted candidate by calling
//! [`MentionController::insert_mention`] or
//! [`MentionController::insert_channel_mention`].
//!
//! A trigger is the whitespace-delimited token ending at the caret whose first
//! character is `@` or `#`. Tokens glued to preceding text (`a@b`, `\@x`,
//! `foo#bar`) never trigger.

use derive_more::IsVariant;
use serde::Serialize;

use super::chat_composer::CacheWrite;
use super::chat_composer::ChatComposer;
use crate::input_widget::SelectionRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IsVariant)]
#[serde(rename_all = "snake_case")]
pub enum MentionKind {
    User,
    Channel,
}

impl MentionKind {
    pub fn trigger_char(self) -> char {
        match self {
            MentionKind::User => '@',
            MentionKind::Channel => '#',
        }
    }

    fn from_trigger_char(ch: char) -> Option<Self> {
        match ch {
            '@' => Some(MentionKind::User),
            '#' => Some(MentionKind::Channel),
            _ => None,
        }
    }
}

/// An in-progress mention fragment in the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionTrigger {
    pub kind: MentionKind,
    /// Byte offset of the trigger character.
    pub start: usize,
    /// Byte offset just past the token (next whitespace or end of text).
    pub end: usize,
    /// Text typed between the trigger character and the caret.
    pub filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("selection {start}..{end} is outside the draft (len {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("selection start {start} is after end {end}")]
    Inverted { start: usize, end: usize },
}

/// Locate the mention fragment the caret is currently typing, if any.
pub fn find_mention_trigger(text: &str, cursor: usize) -> Option<MentionTrigger> {
    let cursor = clamp_to_char_boundary(text, cursor);
    let before_cursor = &text[..cursor];
    let after_cursor = &text[cursor..];

    let start = before_cursor
        .char_indices()
        .rfind(|(_, c)| c.is_whitespace())
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0);
    if start == cursor {
        return None;
    }

    let trigger_char = text[start..].chars().next()?;
    let kind = MentionKind::from_trigger_char(trigger_char)?;

    let end_rel = after_cursor
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(idx, _)| idx)
        .unwrap_or(after_cursor.len());

    Some(MentionTrigger {
        kind,
        start,
        end: cursor + end_rel,
        filter: text[start + trigger_char.len_utf8()..cursor].to_string(),
    })
}

fn clamp_to_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[derive(Debug, Default)]
pub struct MentionController {
    pick_selected_counter: u64,
    user_popup_open: bool,
    channel_popup_open: bool,
    mention_filter: String,
    channel_mention_filter: String,
    selection: SelectionRange,
    exclusive_popups: bool,
}

impl MentionController {
    pub fn new(exclusive_popups: bool) -> Self {
        Self {
            exclusive_popups,
            ..Self::default()
        }
    }

    pub fn pick_selected_counter(&self) -> u64 {
        self.pick_selected_counter
    }

    pub fn user_popup_open(&self) -> bool {
        self.user_popup_open
    }

    pub fn channel_popup_open(&self) -> bool {
        self.channel_popup_open
    }

    pub fn any_popup_open(&self) -> bool {
        self.user_popup_open || self.channel_popup_open
    }

    pub fn mention_filter(&self) -> &str {
        &self.mention_filter
    }

    pub fn channel_mention_filter(&self) -> &str {
        &self.channel_mention_filter
    }

    pub fn selection(&self) -> SelectionRange {
        self.selection
    }

    /// Enter was pressed. The caller must suppress the key's default action.
    ///
    /// Returns true when a popup was open and the pick counter advanced.
    pub fn on_enter_key(&mut self) -> bool {
        if !self.any_popup_open() {
            return false;
        }
        self.pick_selected_counter += 1;
        true
    }

    /// Record the selection reported by the widget.
    ///
    /// Offsets must lie within the current draft; violations are rejected
    /// rather than clamped so a misbehaving host is visible.
    pub fn on_selection_changed(
        &mut self,
        selection: SelectionRange,
        text_len: usize,
    ) -> Result<(), SelectionError> {
        if selection.start > selection.end {
            return Err(SelectionError::Inverted {
                start: selection.start,
                end: selection.end,
            });
        }
        if !selection.fits_within(text_len) {
            return Err(SelectionError::OutOfBounds {
                start: selection.start,
                end: selection.end,
                len: text_len,
            });
        }
        self.selection = selection;
        Ok(())
    }

    pub fn set_user_mention_popup_open(&mut self, open: bool) {
        self.set_popup_open(MentionKind::User, open);
    }

    pub fn set_channel_mention_popup_open(&mut self, open: bool) {
        self.set_popup_open(MentionKind::Channel, open);
    }

    pub fn close_popups(&mut self) {
        self.set_popup_open(MentionKind::User, false);
        self.set_popup_open(MentionKind::Channel, false);
    }

    /// Re-run trigger detection after the widget reported new text.
    ///
    /// A popup is open exactly while a trigger of its kind sits under the caret.
    /// Only one token can be under the caret, so a detected trigger closes the
    /// other popup even when popups are otherwise independent.
    pub fn on_change_text(&mut self, text: &str) {
        let trigger = find_mention_trigger(text, self.selection.cursor());
        tracing::trace!(trigger = ?trigger.as_ref().map(|t| t.kind), "mention trigger scan");
        match trigger {
            Some(MentionTrigger {
                kind: MentionKind::User,
                filter,
                ..
            }) => {
                self.set_channel_mention_popup_open(false);
                self.mention_filter = filter;
                self.set_user_mention_popup_open(true);
            }
            Some(MentionTrigger {
                kind: MentionKind::Channel,
                filter,
                ..
            }) => {
                self.set_user_mention_popup_open(false);
                self.channel_mention_filter = filter;
                self.set_channel_mention_popup_open(true);
            }
            None => self.close_popups(),
        }
    }

    /// Park the caret at the end of the text if the recorded selection no
    /// longer fits it. Returns true when the selection was moved.
    pub fn fit_selection_to(&mut self, text_len: usize) -> bool {
        if self.selection.fits_within(text_len) {
            return false;
        }
        self.selection = SelectionRange::caret(text_len);
        true
    }

    /// The composer replaced its text wholesale (conversation switch, edit
    /// target change, submit). Park the caret at the end and drop popups.
    pub fn on_text_replaced(&mut self, text_len: usize) {
        self.selection = SelectionRange::caret(text_len);
        self.close_popups();
    }

    pub fn insert_mention(&mut self, composer: &mut ChatComposer, username: &str) -> bool {
        self.insert(composer, MentionKind::User, username)
    }

    pub fn insert_channel_mention(&mut self, composer: &mut ChatComposer, channel: &str) -> bool {
        self.insert(composer, MentionKind::Channel, channel)
    }

    /// Replace the in-progress fragment with `name`, then close the popup.
    ///
    /// Without a matching fragment under the caret the draft is left alone and
    /// the popup still closes.
    fn insert(&mut self, composer: &mut ChatComposer, kind: MentionKind, name: &str) -> bool {
        let trigger = find_mention_trigger(composer.text(), self.selection.cursor())
            .filter(|trigger| trigger.kind == kind);

        let inserted = match trigger {
            Some(trigger) => {
                let text = composer.text();
                let rest = &text[trigger.end..];
                let needs_space = !rest.starts_with(char::is_whitespace);

                let mut new_text = String::with_capacity(text.len() + name.len() + 2);
                new_text.push_str(&text[..trigger.start]);
                new_text.push(kind.trigger_char());
                new_text.push_str(name);
                if needs_space {
                    new_text.push(' ');
                }
                new_text.push_str(rest);

                // Caret lands after the separating whitespace.
                let caret = trigger.start + kind.trigger_char().len_utf8() + name.len() + 1;
                composer.set_text(new_text, CacheWrite::Write);
                self.selection = SelectionRange::caret(caret.min(composer.text().len()));
                true
            }
            None => {
                tracing::debug!(kind = ?kind, "mention picked without a trigger fragment");
                false
            }
        };

        self.set_popup_open(kind, false);
        inserted
    }

    fn set_popup_open(&mut self, kind: MentionKind, open: bool) {
        if open && self.exclusive_popups {
            let other = match kind {
                MentionKind::User => MentionKind::Channel,
                MentionKind::Channel => MentionKind::User,
            };
            self.set_popup_open(other, false);
        }
        match kind {
            MentionKind::User => {
                self.user_popup_open = open;
                if !open {
                    self.mention_filter.clear();
                }
            }
            MentionKind::Channel => {
                self.channel_popup_open = open;
                if !open {
                    self.channel_mention_filter.clear();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_input_protocol::ConversationId;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::unbounded_channel;

    use crate::app_event::AppEvent;
    use crate::app_event_sender::AppEventSender;
    use crate::input_area::DraftCache;
    use crate::input_widget::RecordingWidget;

    fn composer_with(text: &str, cache: &DraftCache) -> ChatComposer {
        let (tx, _rx) = unbounded_channel::<AppEvent>();
        let mut composer = ChatComposer::new(
            ConversationId::new("a"),
            cache.clone(),
            Box::new(RecordingWidget::new()),
            AppEventSender::new(tx),
        );
        composer.set_text(text.to_string(), CacheWrite::Write);
        composer
    }

    fn controller_at(text: &str, cursor: usize) -> MentionController {
        let mut controller = MentionController::new(false);
        controller
            .on_selection_changed(SelectionRange::caret(cursor), text.len())
            .expect("valid selection");
        controller
    }

    #[test]
    fn trigger_detection_cases() {
        let cases = vec![
            ("@", 1, Some((MentionKind::User, 0, "")), "lone trigger"),
            ("@ali", 4, Some((MentionKind::User, 0, "ali")), "typing a name"),
            ("@alice", 3, Some((MentionKind::User, 0, "al")), "caret mid token"),
            ("hi @bo", 6, Some((MentionKind::User, 3, "bo")), "after a word"),
            ("#gen", 4, Some((MentionKind::Channel, 0, "gen")), "channel"),
            ("x\t#ops", 6, Some((MentionKind::Channel, 2, "ops")), "after tab"),
            ("héllo @ü", 10, Some((MentionKind::User, 7, "ü")), "unicode"),
            ("mail a@b", 8, None, "glued to text"),
            ("\\@x", 3, None, "escaped"),
            ("foo#bar", 7, None, "hash inside word"),
            ("@ali ", 5, None, "caret after whitespace"),
            ("@ali", 0, None, "caret before trigger"),
            ("", 0, None, "empty"),
            ("hello", 5, None, "plain word"),
        ];

        for (text, cursor, expected, description) in cases {
            let got = find_mention_trigger(text, cursor)
                .map(|t| (t.kind, t.start, t.filter));
            let expected =
                expected.map(|(kind, start, filter)| (kind, start, filter.to_string()));
            assert_eq!(got, expected, "case: {description} - text {text:?} cursor {cursor}");
        }
    }

    #[test]
    fn trigger_end_covers_rest_of_token() {
        let trigger = find_mention_trigger("hey @alice there", 7).expect("trigger");
        assert_eq!(trigger.start, 4);
        assert_eq!(trigger.end, 10);
        assert_eq!(trigger.filter, "al");
    }

    #[test]
    fn cursor_inside_multibyte_char_is_clamped() {
        // Byte 2 is inside "é"; the caret snaps back to byte 1.
        let trigger = find_mention_trigger("@é", 2).expect("trigger");
        assert_eq!(trigger.filter, "");
    }

    #[test]
    fn enter_only_counts_while_a_popup_is_open() {
        let mut controller = MentionController::new(false);
        assert!(!controller.on_enter_key());
        assert_eq!(controller.pick_selected_counter(), 0);

        controller.set_user_mention_popup_open(true);
        assert!(controller.on_enter_key());
        assert!(controller.on_enter_key());
        assert_eq!(controller.pick_selected_counter(), 2);

        controller.set_user_mention_popup_open(false);
        controller.set_channel_mention_popup_open(true);
        assert!(controller.on_enter_key());
        assert_eq!(controller.pick_selected_counter(), 3);
    }

    #[test]
    fn popups_are_independent_by_default() {
        let mut controller = MentionController::new(false);
        controller.set_user_mention_popup_open(true);
        controller.set_channel_mention_popup_open(true);
        assert!(controller.user_popup_open());
        assert!(controller.channel_popup_open());
    }

    #[test]
    fn exclusive_popups_close_each_other() {
        let mut controller = MentionController::new(true);
        controller.set_user_mention_popup_open(true);
        controller.set_channel_mention_popup_open(true);
        assert!(!controller.user_popup_open());
        assert!(controller.channel_popup_open());
    }

    #[test]
    fn selection_outside_text_is_rejected() {
        let mut controller = controller_at("hello", 2);
        assert_eq!(
            controller.on_selection_changed(SelectionRange::new(1, 9), 5),
            Err(SelectionError::OutOfBounds {
                start: 1,
                end: 9,
                len: 5
            })
        );
        assert_eq!(
            controller.on_selection_changed(SelectionRange::new(4, 1), 5),
            Err(SelectionError::Inverted { start: 4, end: 1 })
        );
        assert_eq!(controller.selection(), SelectionRange::caret(2));

        controller
            .on_selection_changed(SelectionRange::new(0, 5), 5)
            .expect("full selection is valid");
        assert_eq!(controller.selection(), SelectionRange::new(0, 5));
    }

    #[test]
    fn fit_selection_only_moves_a_stale_selection() {
        let mut controller = controller_at("hello", 5);
        assert!(!controller.fit_selection_to(5));
        assert_eq!(controller.selection(), SelectionRange::caret(5));

        assert!(controller.fit_selection_to(2));
        assert_eq!(controller.selection(), SelectionRange::caret(2));
    }

    #[test]
    fn change_text_opens_matching_popup_with_filter() {
        let mut controller = controller_at("hi @bo", 6);
        controller.on_change_text("hi @bo");
        assert!(controller.user_popup_open());
        assert!(!controller.channel_popup_open());
        assert_eq!(controller.mention_filter(), "bo");

        controller
            .on_selection_changed(SelectionRange::caret(7), 7)
            .expect("valid");
        controller.on_change_text("hi #bob");
        assert!(!controller.user_popup_open());
        assert!(controller.channel_popup_open());
        assert_eq!(controller.channel_mention_filter(), "bob");
        assert_eq!(controller.mention_filter(), "");

        controller
            .on_selection_changed(SelectionRange::caret(8), 8)
            .expect("valid");
        controller.on_change_text("hi #bob ");
        assert!(!controller.any_popup_open());
    }

    #[test]
    fn trigger_scan_closes_other_popup_even_when_independent() {
        let mut controller = MentionController::new(false);
        controller.set_user_mention_popup_open(true);
        controller.set_channel_mention_popup_open(true);

        controller
            .on_selection_changed(SelectionRange::caret(4), 4)
            .expect("valid");
        controller.on_change_text("#ops");
        assert!(!controller.user_popup_open());
        assert!(controller.channel_popup_open());
        assert_eq!(controller.channel_mention_filter(), "ops");

        // The explicit setters stay independent.
        controller.set_user_mention_popup_open(true);
        assert!(controller.channel_popup_open());
    }

    #[test]
    fn insert_mention_replaces_fragment() {
        let cache = DraftCache::new();
        let mut composer = composer_with("hey @al there", &cache);
        let mut controller = controller_at(composer.text(), 7);
        controller.set_user_mention_popup_open(true);

        assert!(controller.insert_mention(&mut composer, "alice"));
        assert_eq!(composer.text(), "hey @alice there");
        assert_eq!(controller.selection(), SelectionRange::caret(11));
        assert!(!controller.user_popup_open());
        assert_eq!(cache.get(&ConversationId::new("a")), "hey @alice there");
    }

    #[test]
    fn insert_at_end_appends_trailing_space() {
        let cache = DraftCache::new();
        let mut composer = composer_with("ping #op", &cache);
        let mut controller = controller_at(composer.text(), 8);
        controller.set_channel_mention_popup_open(true);

        assert!(controller.insert_channel_mention(&mut composer, "ops"));
        assert_eq!(composer.text(), "ping #ops ");
        assert_eq!(controller.selection(), SelectionRange::caret(10));
        assert!(!controller.channel_popup_open());
    }

    #[test]
    fn insert_without_fragment_only_closes_popup() {
        let cache = DraftCache::new();
        let mut composer = composer_with("no trigger here", &cache);
        let mut controller = controller_at(composer.text(), 15);
        controller.set_user_mention_popup_open(true);

        assert!(!controller.insert_mention(&mut composer, "alice"));
        assert_eq!(composer.text(), "no trigger here");
        assert!(!controller.user_popup_open());
    }

    #[test]
    fn insert_ignores_fragment_of_other_kind() {
        let cache = DraftCache::new();
        let mut composer = composer_with("#gen", &cache);
        let mut controller = controller_at(composer.text(), 4);
        controller.set_user_mention_popup_open(true);

        assert!(!controller.insert_mention(&mut composer, "alice"));
        assert_eq!(composer.text(), "#gen");
    }

    #[test]
    fn text_replacement_parks_caret_at_end() {
        let mut controller = controller_at("@al", 3);
        controller.on_change_text("@al");
        assert!(controller.user_popup_open());

        controller.on_text_replaced(12);
        assert_eq!(controller.selection(), SelectionRange::caret(12));
        assert!(!controller.any_popup_open());
        assert_eq!(controller.mention_filter(), "");
    }
}
