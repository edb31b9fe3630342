mod conversation;
mod hidden_string;
pub mod message;
pub mod protocol;

pub use conversation::ConversationId;
pub use conversation::ConversationMeta;
pub use conversation::Ordinal;
pub use hidden_string::HiddenString;
