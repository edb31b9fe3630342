use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use chat_input_protocol::ConversationId;

/// Unsent draft text per conversation, shared by every composer in a session.
///
/// Construct one per application session and hand clones to each
/// [`ChatComposer`](super::ChatComposer). Clones share the same map. Entries
/// are never evicted; an empty draft removes the entry so the map only holds
/// conversations with real unsent text.
///
/// Access is serialized behind a mutex so a multi-threaded host cannot lose
/// updates for the same conversation.
#[derive(Debug, Clone, Default)]
pub struct DraftCache {
    drafts: Arc<Mutex<HashMap<ConversationId, String>>>,
}

impl DraftCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached draft for `conversation_id`, or an empty string.
    pub fn get(&self, conversation_id: &ConversationId) -> String {
        self.lock().get(conversation_id).cloned().unwrap_or_default()
    }

    pub fn set(&self, conversation_id: &ConversationId, text: &str) {
        let mut drafts = self.lock();
        if text.is_empty() {
            drafts.remove(conversation_id);
        } else {
            drafts.insert(conversation_id.clone(), text.to_string());
        }
        tracing::trace!(
            conversation_id = %conversation_id,
            len = text.len(),
            "draft cache updated"
        );
    }

    pub fn contains(&self, conversation_id: &ConversationId) -> bool {
        self.lock().contains_key(conversation_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConversationId, String>> {
        // The map holds plain strings; a panic mid-update cannot leave it inconsistent.
        self.drafts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
