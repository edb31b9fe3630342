//! Requests the composer dispatches to the host's action bus.
//!
//! Every request is fire-and-forget from the composer's point of view; delivery
//! failures belong to whoever consumes the bus.

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

use crate::ConversationId;
use crate::HiddenString;
use crate::Ordinal;

/// Which message a begin-editing request refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditRequest {
    /// The most recent message authored by `username`.
    LastOwnMessage { username: String },
    /// An explicit message.
    Ordinal { ordinal: Ordinal },
}

/// Action bus vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComposerAction {
    /// Post a new message.
    SendMessage {
        conversation_id: ConversationId,
        text: HiddenString,
    },

    /// Replace the body of an existing message.
    EditMessage {
        conversation_id: ConversationId,
        ordinal: Ordinal,
        text: HiddenString,
    },

    /// Put a message into edit mode. The host answers by supplying a new edit
    /// target to the composer.
    BeginEditing {
        conversation_id: ConversationId,
        target: EditRequest,
    },

    /// Leave edit mode. The host answers by clearing the edit target.
    EndEditing { conversation_id: ConversationId },

    JoinChannel { conversation_id: ConversationId },

    LeaveChannel {
        conversation_id: ConversationId,
        team_name: String,
    },

    /// Typing indicator for other participants.
    UpdateTyping {
        conversation_id: ConversationId,
        typing: bool,
    },
}

impl ComposerAction {
    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            ComposerAction::SendMessage {
                conversation_id, ..
            }
            | ComposerAction::EditMessage {
                conversation_id, ..
            }
            | ComposerAction::BeginEditing {
                conversation_id, ..
            }
            | ComposerAction::EndEditing { conversation_id }
            | ComposerAction::JoinChannel { conversation_id }
            | ComposerAction::LeaveChannel {
                conversation_id, ..
            }
            | ComposerAction::UpdateTyping {
                conversation_id, ..
            } => conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_names_the_action_kind_only() {
        let action = ComposerAction::SendMessage {
            conversation_id: ConversationId::new("c1"),
            text: HiddenString::new("secret"),
        };
        assert_eq!(action.to_string(), "send_message");
        assert_eq!(action.conversation_id(), &ConversationId::new("c1"));
    }

    #[test]
    fn begin_editing_last_message_encoding() {
        let action = ComposerAction::BeginEditing {
            conversation_id: ConversationId::new("c1"),
            target: EditRequest::LastOwnMessage {
                username: "alice".to_string(),
            },
        };
        let json = serde_json::to_string(&action).expect("encode");
        assert_eq!(
            json,
            r#"{"type":"begin_editing","conversation_id":"c1","target":{"type":"last_own_message","username":"alice"}}"#
        );
        let decoded: ComposerAction = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded, action);
    }
}
