//! Host-facing wiring for the message input surface.
//!
//! [`InputArea`] combines the [`ChatComposer`] (draft text and compose/edit
//! mode), the [`MentionController`] (autocomplete popups) and the
//! [`TypingThrottle`]. The host feeds it three kinds of input:
//!
//! - Props snapshots via [`InputArea::set_props`], diffed against the previous
//!   snapshot (conversation, edit target, focus counter).
//! - Widget reports: text changes, selection changes and "the widget now shows
//!   the current text" ([`InputArea::on_widget_synced`]).
//! - Key events the widget does not consume itself (Enter, Up, Esc).
//!
//! Everything the host must act on (sends, edits, typing indicators, scroll
//! requests) leaves through the [`AppEventSender`].

mod chat_composer;
mod draft_cache;
mod mention;
mod typing_throttle;

pub use chat_composer::CacheWrite;
pub use chat_composer::ChatComposer;
pub use chat_composer::Mode;
pub use draft_cache::DraftCache;
pub use mention::MentionController;
pub use mention::MentionKind;
pub use mention::MentionTrigger;
pub use mention::SelectionError;
pub use mention::find_mention_trigger;
pub use typing_throttle::TypingThrottle;

use std::time::Instant;

use chat_input_protocol::ConversationId;
use chat_input_protocol::ConversationMeta;
use chat_input_protocol::Ordinal;
use chat_input_protocol::message::EditTarget;
use chat_input_protocol::protocol::ComposerAction;
use chat_input_protocol::protocol::EditRequest;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use derive_more::IsVariant;
use serde::Deserialize;
use serde::Serialize;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::input_widget::InputWidget;
use crate::input_widget::SelectionRange;
use crate::settings::ComposerSettings;

/// Snapshot of host state relevant to the input area.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InputAreaProps {
    pub conversation_id: ConversationId,
    #[serde(default)]
    pub meta: ConversationMeta,
    /// Message being edited, if any.
    #[serde(default)]
    pub editing: Option<EditTarget>,
    /// Display names of participants currently typing. Passed through untouched.
    #[serde(default)]
    pub typing: Vec<String>,
    /// Any increase refocuses the widget.
    #[serde(default)]
    pub focus_input_counter: u64,
    /// The signed-in user, used to find "my last message".
    #[serde(default)]
    pub username: String,
}

impl InputAreaProps {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            meta: ConversationMeta::default(),
            editing: None,
            typing: Vec::new(),
            focus_input_counter: 0,
            username: String::new(),
        }
    }
}

pub struct InputAreaParams {
    pub props: InputAreaProps,
    pub draft_cache: DraftCache,
    pub widget: Box<dyn InputWidget>,
    pub app_event_tx: AppEventSender,
    pub settings: ComposerSettings,
}

/// What a key press turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOutcome {
    Submitted,
    /// Enter while a popup is open: the pick counter advanced.
    MentionPicked,
    EditLastMessageRequested,
    CancelEditingRequested,
    PopupsClosed,
    /// Enter with nothing to submit. The default action is still suppressed.
    Suppressed,
    /// Not ours; the widget should apply its default behavior.
    Unhandled,
}

pub struct InputArea {
    composer: ChatComposer,
    mentions: MentionController,
    typing_throttle: TypingThrottle,
    settings: ComposerSettings,
    app_event_tx: AppEventSender,
    meta: ConversationMeta,
    typing: Vec<String>,
    focus_input_counter: u64,
    username: String,
}

impl InputArea {
    pub fn new(params: InputAreaParams) -> Self {
        let InputAreaParams {
            props,
            draft_cache,
            widget,
            app_event_tx,
            settings,
        } = params;

        let composer = ChatComposer::new(
            props.conversation_id.clone(),
            draft_cache,
            widget,
            app_event_tx.clone(),
        );
        let mut this = Self {
            composer,
            mentions: MentionController::new(settings.exclusive_mention_popups),
            typing_throttle: TypingThrottle::new(settings.typing_throttle),
            settings,
            app_event_tx,
            meta: ConversationMeta::default(),
            typing: Vec::new(),
            focus_input_counter: props.focus_input_counter,
            username: String::new(),
        };
        this.mentions.on_text_replaced(this.composer.text().len());
        // Route the initial snapshot through the normal diff so an initial
        // edit target is handled like any other.
        this.set_props(props);
        this
    }

    /// Apply a new props snapshot from the host.
    pub fn set_props(&mut self, props: InputAreaProps) {
        let InputAreaProps {
            conversation_id,
            meta,
            editing,
            typing,
            focus_input_counter,
            username,
        } = props;

        let mut replaced = false;
        if conversation_id != *self.composer.conversation_id() {
            self.stop_typing(Instant::now());
            self.typing_throttle.reset();
            replaced |= self.composer.on_conversation_changed(conversation_id);
        }
        // After the conversation switch so leaving edit mode restores the new
        // conversation's draft.
        replaced |= self.composer.on_edit_target_changed(editing);

        if focus_input_counter > self.focus_input_counter {
            self.composer.focus();
        }
        self.focus_input_counter = focus_input_counter;
        self.meta = meta;
        self.typing = typing;
        self.username = username;

        if replaced {
            self.mentions.on_text_replaced(self.composer.text().len());
        }
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> KeyOutcome {
        if key_event.kind == KeyEventKind::Release {
            return KeyOutcome::Unhandled;
        }

        match key_event {
            KeyEvent {
                code: KeyCode::Enter,
                modifiers: KeyModifiers::NONE,
                ..
            } => {
                if self.mentions.on_enter_key() {
                    KeyOutcome::MentionPicked
                } else if self.submit() {
                    KeyOutcome::Submitted
                } else {
                    KeyOutcome::Suppressed
                }
            }
            KeyEvent {
                code: KeyCode::Up,
                modifiers: KeyModifiers::NONE,
                ..
            } if !self.mentions.any_popup_open() => {
                if self.composer.edit_last_message(&self.username) {
                    KeyOutcome::EditLastMessageRequested
                } else {
                    KeyOutcome::Unhandled
                }
            }
            KeyEvent {
                code: KeyCode::Esc, ..
            } => {
                if self.mentions.any_popup_open() {
                    self.mentions.close_popups();
                    KeyOutcome::PopupsClosed
                } else if self.composer.cancel_editing() {
                    KeyOutcome::CancelEditingRequested
                } else {
                    KeyOutcome::Unhandled
                }
            }
            _ => KeyOutcome::Unhandled,
        }
    }

    /// The widget reports its full new text.
    pub fn on_change_text(&mut self, text: String) {
        self.on_change_text_at(text, Instant::now());
    }

    pub fn on_change_text_at(&mut self, text: String, now: Instant) {
        let typing = !text.is_empty();
        let selection = self.composer.widget().selection();
        self.composer.set_text(text, CacheWrite::Write);
        let text_len = self.composer.text().len();
        if let Err(err) = self.mentions.on_selection_changed(selection, text_len) {
            tracing::warn!("widget reported an invalid selection: {err}");
            // The previous selection may point past the end of the new text.
            self.mentions.fit_selection_to(text_len);
        }
        self.mentions.on_change_text(self.composer.text());
        self.update_typing(typing, now);
    }

    pub fn on_selection_changed(&mut self, selection: SelectionRange) -> Result<(), SelectionError> {
        self.mentions
            .on_selection_changed(selection, self.composer.text().len())
    }

    pub fn submit(&mut self) -> bool {
        if !self.composer.submit() {
            return false;
        }
        self.stop_typing(Instant::now());
        self.mentions.on_text_replaced(self.composer.text().len());
        true
    }

    pub fn cancel_editing(&self) -> bool {
        self.composer.cancel_editing()
    }

    pub fn edit_last_message(&self) -> bool {
        self.composer.edit_last_message(&self.username)
    }

    /// Request editing of a specific message.
    pub fn edit_message(&self, ordinal: Ordinal) {
        self.dispatch(ComposerAction::BeginEditing {
            conversation_id: self.composer.conversation_id().clone(),
            target: EditRequest::Ordinal { ordinal },
        });
    }

    pub fn insert_mention(&mut self, username: &str) -> bool {
        self.mentions.insert_mention(&mut self.composer, username)
    }

    pub fn insert_channel_mention(&mut self, channel: &str) -> bool {
        self.mentions
            .insert_channel_mention(&mut self.composer, channel)
    }

    pub fn set_user_mention_popup_open(&mut self, open: bool) {
        self.mentions.set_user_mention_popup_open(open);
    }

    pub fn set_channel_mention_popup_open(&mut self, open: bool) {
        self.mentions.set_channel_mention_popup_open(open);
    }

    pub fn on_join_channel(&self) {
        self.dispatch(ComposerAction::JoinChannel {
            conversation_id: self.composer.conversation_id().clone(),
        });
    }

    pub fn on_leave_channel(&self) {
        self.dispatch(ComposerAction::LeaveChannel {
            conversation_id: self.composer.conversation_id().clone(),
            team_name: self.meta.team_name.clone(),
        });
    }

    /// The widget has rendered the current text; run deferred widget work.
    pub fn on_widget_synced(&mut self) -> bool {
        self.composer.on_widget_synced()
    }

    /// Call from a UI tick; see [`InputArea::next_typing_deadline`].
    pub fn flush_typing_if_due(&mut self, now: Instant) -> bool {
        match self.typing_throttle.flush_if_due(now) {
            Some(typing) => {
                self.dispatch_typing(typing);
                true
            }
            None => false,
        }
    }

    pub fn next_typing_deadline(&self) -> Option<Instant> {
        self.typing_throttle.next_deadline()
    }

    pub fn blur(&mut self) {
        self.composer.blur();
    }

    pub fn composer(&self) -> &ChatComposer {
        &self.composer
    }

    pub fn mentions(&self) -> &MentionController {
        &self.mentions
    }

    pub fn text(&self) -> &str {
        self.composer.text()
    }

    pub fn mode(&self) -> Mode {
        self.composer.mode()
    }

    pub fn is_editing(&self) -> bool {
        self.composer.is_editing()
    }

    pub fn conversation_id(&self) -> &ConversationId {
        self.composer.conversation_id()
    }

    pub fn channel_name(&self) -> &str {
        &self.meta.channel_name
    }

    pub fn typing(&self) -> &[String] {
        &self.typing
    }

    /// The input area never blocks on loading; kept for view parity.
    pub fn is_loading(&self) -> bool {
        false
    }

    fn update_typing(&mut self, typing: bool, now: Instant) {
        if !self.settings.typing_notifications {
            return;
        }
        if let Some(typing) = self.typing_throttle.on_typing(typing, now) {
            self.dispatch_typing(typing);
        }
    }

    fn stop_typing(&mut self, now: Instant) {
        self.update_typing(false, now);
    }

    fn dispatch_typing(&self, typing: bool) {
        self.dispatch(ComposerAction::UpdateTyping {
            conversation_id: self.composer.conversation_id().clone(),
            typing,
        });
    }

    fn dispatch(&self, action: ComposerAction) {
        self.app_event_tx.send(AppEvent::Dispatch(action));
    }
}
