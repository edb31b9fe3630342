use serde::Deserialize;
use serde::Serialize;

use crate::ConversationId;
use crate::HiddenString;
use crate::Ordinal;

/// Body of a sent message, as far as the composer cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageBody {
    Text { text: HiddenString },
    /// Attachments, system messages and anything else that cannot be edited as text.
    Other { kind: String },
}

impl MessageBody {
    pub fn text(text: impl Into<HiddenString>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Text to pre-fill the composer with when editing this message.
    pub fn editable_text(&self) -> &str {
        match self {
            MessageBody::Text { text } => text.reveal(),
            MessageBody::Other { .. } => "",
        }
    }
}

/// A message the user is currently editing in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditTarget {
    pub conversation_id: ConversationId,
    pub ordinal: Ordinal,
    pub body: MessageBody,
}

impl EditTarget {
    pub fn new(conversation_id: ConversationId, ordinal: Ordinal, body: MessageBody) -> Self {
        Self {
            conversation_id,
            ordinal,
            body,
        }
    }

    /// Two targets refer to the same message when conversation and ordinal match.
    ///
    /// Body updates for the same message (e.g. a server echo) are not a new target.
    pub fn same_message(&self, other: &EditTarget) -> bool {
        self.conversation_id == other.conversation_id && self.ordinal == other.ordinal
    }
}

/// Compares two optional edit targets by message identity.
pub fn same_edit_target(a: Option<&EditTarget>, b: Option<&EditTarget>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same_message(b),
        _ => false,
    }
}
