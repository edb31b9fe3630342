//! Application-level events emitted by the input area.

use chat_input_protocol::protocol::ComposerAction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Forward a request to the host's action bus. Using an `AppEvent` for this
    /// avoids bubbling channels through the composer and mention controller.
    Dispatch(ComposerAction),

    /// A message was sent or edited; the host should scroll the transcript to
    /// the newest message.
    ScrollToBottom,
}
