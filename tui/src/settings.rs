use std::time::Duration;

/// Default spacing between "still typing" notifications.
pub const DEFAULT_TYPING_THROTTLE: Duration = Duration::from_secs(5);

/// Behavior switches for the input area, resolved from the user's config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerSettings {
    /// When true, opening one mention popup closes the other.
    pub exclusive_mention_popups: bool,
    /// Emit typing indicators while the user types.
    pub typing_notifications: bool,
    pub typing_throttle: Duration,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            exclusive_mention_popups: false,
            typing_notifications: true,
            typing_throttle: DEFAULT_TYPING_THROTTLE,
        }
    }
}
