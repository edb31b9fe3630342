//! The chat composer owns the draft text of the active conversation.
//!
//! It arbitrates between two modes:
//!
//! - [`Mode::Composing`]: the draft is a new, unsent message. Every cached
//!   [`ChatComposer::set_text`] (in either mode) mirrors the text into the
//!   shared [`DraftCache`] so it survives conversation switches.
//! - [`Mode::Editing`]: the draft is the body of an already-sent message. The
//!   mode is derived from the presence of an [`EditTarget`] and is never stored
//!   on its own, so the two cannot disagree.
//!
//! # Transitions
//!
//! - Conversation switch: the draft is replaced by the new conversation's
//!   cached text, without writing that text back into the cache.
//! - Edit target change: the draft is first blanked, then filled with the
//!   target's body (entering editing) or the cached unsent draft (leaving
//!   editing). Neither write touches the cache, so an unsent draft is never
//!   clobbered by edit text.
//! - Submit: dispatches send or edit, clears the draft and the cache entry of
//!   the current conversation, and asks the host to scroll to the bottom.
//!
//! # Deferred select-all
//!
//! After an edit target change the widget should select its whole content,
//! but only once it displays the new text. The composer records a pending
//! request and performs it in [`ChatComposer::on_widget_synced`], which the
//! host calls after pushing the new text into the widget. A newer edit target
//! change, a conversation switch or a submit replaces or cancels the pending
//! request so stale content is never selected.

use chat_input_protocol::ConversationId;
use chat_input_protocol::HiddenString;
use chat_input_protocol::message::EditTarget;
use chat_input_protocol::message::same_edit_target;
use chat_input_protocol::protocol::ComposerAction;
use chat_input_protocol::protocol::EditRequest;
use derive_more::IsVariant;

use super::draft_cache::DraftCache;
use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::input_widget::InputWidget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Mode {
    Composing,
    Editing,
}

/// Whether a [`ChatComposer::set_text`] call mirrors the text into the draft cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Write,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSelectAll {
    generation: u64,
}

pub struct ChatComposer {
    text: String,
    conversation_id: ConversationId,
    edit_target: Option<EditTarget>,
    draft_cache: DraftCache,
    widget: Box<dyn InputWidget>,
    app_event_tx: AppEventSender,
    pending_select_all: Option<PendingSelectAll>,
    select_all_generation: u64,
}

impl ChatComposer {
    /// Create a composer for `conversation_id`, restoring its cached draft if any.
    pub fn new(
        conversation_id: ConversationId,
        draft_cache: DraftCache,
        widget: Box<dyn InputWidget>,
        app_event_tx: AppEventSender,
    ) -> Self {
        let text = draft_cache.get(&conversation_id);
        Self {
            text,
            conversation_id,
            edit_target: None,
            draft_cache,
            widget,
            app_event_tx,
            pending_select_all: None,
            select_all_generation: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn mode(&self) -> Mode {
        if self.edit_target.is_some() {
            Mode::Editing
        } else {
            Mode::Composing
        }
    }

    pub fn is_editing(&self) -> bool {
        self.mode().is_editing()
    }

    pub fn has_pending_select_all(&self) -> bool {
        self.pending_select_all.is_some()
    }

    /// The single mutation path for the draft text.
    pub fn set_text(&mut self, text: String, cache: CacheWrite) {
        if cache == CacheWrite::Write {
            self.draft_cache.set(&self.conversation_id, &text);
        }
        self.text = text;
    }

    /// Dispatch the draft as a new message or as an edit, then clear it.
    ///
    /// Returns false (and dispatches nothing) for a blank draft.
    pub fn submit(&mut self) -> bool {
        if self.text.trim().is_empty() {
            return false;
        }

        let text = HiddenString::new(self.text.clone());
        let action = match &self.edit_target {
            Some(target) => ComposerAction::EditMessage {
                conversation_id: target.conversation_id.clone(),
                ordinal: target.ordinal,
                text,
            },
            None => ComposerAction::SendMessage {
                conversation_id: self.conversation_id.clone(),
                text,
            },
        };
        self.app_event_tx.send(AppEvent::Dispatch(action));

        self.pending_select_all = None;
        self.set_text(String::new(), CacheWrite::Write);
        self.app_event_tx.send(AppEvent::ScrollToBottom);
        true
    }

    /// Ask the host to leave edit mode. The draft is restored once the host
    /// clears the edit target via [`ChatComposer::on_edit_target_changed`].
    pub fn cancel_editing(&self) -> bool {
        if !self.is_editing() {
            return false;
        }
        self.app_event_tx
            .send(AppEvent::Dispatch(ComposerAction::EndEditing {
                conversation_id: self.conversation_id.clone(),
            }));
        true
    }

    /// Ask the host to start editing `username`'s last message.
    ///
    /// Only allowed while the draft is empty so an in-progress draft is never
    /// replaced.
    pub fn edit_last_message(&self, username: &str) -> bool {
        if !self.text.is_empty() {
            return false;
        }
        self.app_event_tx
            .send(AppEvent::Dispatch(ComposerAction::BeginEditing {
                conversation_id: self.conversation_id.clone(),
                target: EditRequest::LastOwnMessage {
                    username: username.to_string(),
                },
            }));
        true
    }

    /// Returns true when the draft text was replaced.
    pub fn on_conversation_changed(&mut self, conversation_id: ConversationId) -> bool {
        if conversation_id == self.conversation_id {
            return false;
        }
        tracing::debug!(
            from = %self.conversation_id,
            to = %conversation_id,
            "composer switched conversation"
        );
        self.conversation_id = conversation_id;
        self.pending_select_all = None;
        let text = self.draft_cache.get(&self.conversation_id);
        self.set_text(text, CacheWrite::Skip);
        true
    }

    /// Returns true when the draft text was replaced.
    pub fn on_edit_target_changed(&mut self, edit_target: Option<EditTarget>) -> bool {
        if same_edit_target(self.edit_target.as_ref(), edit_target.as_ref()) {
            self.edit_target = edit_target;
            return false;
        }

        let was_editing = self.is_editing();
        if let Some(target) = &edit_target
            && target.conversation_id != self.conversation_id
        {
            tracing::warn!(
                current = %self.conversation_id,
                target = %target.conversation_id,
                "edit target belongs to a different conversation"
            );
        }
        self.edit_target = edit_target;

        // Blank first so unsent text can never interleave with editing state.
        self.set_text(String::new(), CacheWrite::Skip);
        let text = match &self.edit_target {
            Some(target) => target.body.editable_text().to_string(),
            None => self.draft_cache.get(&self.conversation_id),
        };
        self.set_text(text, CacheWrite::Skip);

        self.select_all_generation += 1;
        self.pending_select_all = Some(PendingSelectAll {
            generation: self.select_all_generation,
        });

        tracing::debug!(
            conversation_id = %self.conversation_id,
            mode = ?self.mode(),
            ordinal = ?self.edit_target.as_ref().map(|target| target.ordinal),
            "composer edit target changed"
        );

        if self.is_editing() && !was_editing {
            self.widget.focus();
        }
        true
    }

    /// Second phase of the select-all protocol: the widget now shows the
    /// current text, so a pending selection can run.
    pub fn on_widget_synced(&mut self) -> bool {
        let Some(pending) = self.pending_select_all.take() else {
            return false;
        };
        tracing::trace!(generation = pending.generation, "running deferred select-all");
        self.widget.select_all();
        true
    }

    pub fn focus(&mut self) {
        self.widget.focus();
    }

    pub fn blur(&mut self) {
        self.widget.blur();
    }

    pub fn widget(&self) -> &dyn InputWidget {
        self.widget.as_ref()
    }
}
