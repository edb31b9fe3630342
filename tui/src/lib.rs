// Forbid accidental stdout/stderr writes in the library portion of the composer.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod app_event_sender;
mod input_area;
mod input_widget;
mod settings;

pub use app_event::AppEvent;
pub use app_event_sender::AppEventSender;
pub use input_area::CacheWrite;
pub use input_area::ChatComposer;
pub use input_area::DraftCache;
pub use input_area::InputArea;
pub use input_area::InputAreaParams;
pub use input_area::InputAreaProps;
pub use input_area::KeyOutcome;
pub use input_area::MentionController;
pub use input_area::MentionKind;
pub use input_area::MentionTrigger;
pub use input_area::Mode;
pub use input_area::SelectionError;
pub use input_area::TypingThrottle;
pub use input_area::find_mention_trigger;
pub use input_widget::InputWidget;
pub use input_widget::RecordingWidget;
pub use input_widget::SelectionRange;
pub use input_widget::WidgetCall;
pub use settings::ComposerSettings;
pub use settings::DEFAULT_TYPING_THROTTLE;
