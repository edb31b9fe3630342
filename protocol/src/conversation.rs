use derive_more::Display;
use derive_more::From;
use serde::Deserialize;
use serde::Serialize;

/// Opaque, stable identifier for a conversation.
///
/// The composer never inspects the contents; it is only compared and used as
/// the draft cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Position of a message within its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ordinal(u64);

impl Ordinal {
    pub fn new(ordinal: u64) -> Self {
        Self(ordinal)
    }
}

/// Read-only conversation metadata supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMeta {
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub team_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn conversation_id_serializes_as_plain_string() {
        let id = ConversationId::new("0000f1a2");
        assert_eq!(serde_json::to_string(&id).expect("encode"), "\"0000f1a2\"");
        assert_eq!(id.to_string(), "0000f1a2");
    }

    #[test]
    fn meta_fields_default_when_missing() {
        let meta: ConversationMeta =
            serde_json::from_str(r#"{"channel_name":"general"}"#).expect("decode");
        assert_eq!(
            meta,
            ConversationMeta {
                channel_name: "general".to_string(),
                team_name: String::new(),
            }
        );
    }
}
