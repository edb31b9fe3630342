//! Drive an [`InputArea`] from a JSON-lines script of host events.
//!
//! Each non-empty line is one [`HostEvent`]; lines starting with `//` are
//! comments. The first event must be `props`, since the input area cannot
//! exist without a conversation. Time is virtual: it only moves on `advance`,
//! which keeps typing-indicator throttling deterministic.

use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use chat_input_protocol::ConversationId;
use chat_input_protocol::Ordinal;
use chat_input_protocol::protocol::ComposerAction;
use chat_input_tui::AppEvent;
use chat_input_tui::AppEventSender;
use chat_input_tui::ComposerSettings;
use chat_input_tui::DraftCache;
use chat_input_tui::InputArea;
use chat_input_tui::InputAreaParams;
use chat_input_tui::InputAreaProps;
use chat_input_tui::KeyOutcome;
use chat_input_tui::RecordingWidget;
use chat_input_tui::SelectionRange;
use chat_input_tui::WidgetCall;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::unbounded_channel;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Props(InputAreaProps),
    /// The widget reports new text. `cursor` defaults to the end of `text`.
    ChangeText {
        text: String,
        #[serde(default)]
        cursor: Option<usize>,
    },
    Select {
        start: usize,
        end: usize,
    },
    /// A key such as `enter`, `up`, `esc` or `shift+enter`.
    Key {
        key: String,
    },
    InsertMention {
        name: String,
    },
    InsertChannelMention {
        name: String,
    },
    WidgetSynced,
    JoinChannel,
    LeaveChannel,
    EditMessage {
        ordinal: Ordinal,
    },
    /// Move the virtual clock forward and flush due typing indicators.
    Advance {
        ms: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayOutput {
    Action { action: ComposerAction },
    ScrollToBottom,
    Widget { call: WidgetCall },
    Key { key: String, outcome: KeyOutcome },
    /// The input area refused a host report (e.g. an out-of-range selection).
    Rejected { line: usize, message: String },
    State(StateSnapshot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub conversation_id: ConversationId,
    pub text: String,
    pub editing: bool,
    pub user_popup_open: bool,
    pub channel_popup_open: bool,
    pub mention_filter: String,
    pub channel_mention_filter: String,
    pub pick_selected_counter: u64,
    pub selection: SelectionRange,
    pub drafts_cached: usize,
}

struct Replay {
    area: InputArea,
    widget: RecordingWidget,
    draft_cache: DraftCache,
    app_event_rx: UnboundedReceiver<AppEvent>,
    clock: Instant,
    output: Vec<ReplayOutput>,
}

impl Replay {
    fn new(props: InputAreaProps, settings: ComposerSettings) -> Self {
        let (app_event_tx, app_event_rx) = unbounded_channel();
        let widget = RecordingWidget::new();
        let draft_cache = DraftCache::new();
        let area = InputArea::new(InputAreaParams {
            props,
            draft_cache: draft_cache.clone(),
            widget: Box::new(widget.clone()),
            app_event_tx: AppEventSender::new(app_event_tx),
            settings,
        });
        let mut replay = Self {
            area,
            widget,
            draft_cache,
            app_event_rx,
            clock: Instant::now(),
            output: Vec::new(),
        };
        replay.drain();
        replay
    }

    fn apply(&mut self, line: usize, event: HostEvent) -> anyhow::Result<()> {
        match event {
            HostEvent::Props(props) => self.area.set_props(props),
            HostEvent::ChangeText { text, cursor } => {
                let cursor = cursor.unwrap_or(text.len());
                self.widget.set_selection(SelectionRange::caret(cursor));
                self.area.on_change_text_at(text, self.clock);
            }
            HostEvent::Select { start, end } => {
                let selection = SelectionRange::new(start, end);
                self.widget.set_selection(selection);
                if let Err(err) = self.area.on_selection_changed(selection) {
                    self.output.push(ReplayOutput::Rejected {
                        line,
                        message: err.to_string(),
                    });
                }
            }
            HostEvent::Key { key } => {
                let key_event = parse_key(&key)?;
                let outcome = self.area.handle_key_event(key_event);
                self.output.push(ReplayOutput::Key { key, outcome });
            }
            HostEvent::InsertMention { name } => {
                self.area.insert_mention(&name);
            }
            HostEvent::InsertChannelMention { name } => {
                self.area.insert_channel_mention(&name);
            }
            HostEvent::WidgetSynced => {
                self.area.on_widget_synced();
            }
            HostEvent::JoinChannel => self.area.on_join_channel(),
            HostEvent::LeaveChannel => self.area.on_leave_channel(),
            HostEvent::EditMessage { ordinal } => self.area.edit_message(ordinal),
            HostEvent::Advance { ms } => {
                self.clock += Duration::from_millis(ms);
                self.area.flush_typing_if_due(self.clock);
            }
        }
        self.drain();
        Ok(())
    }

    fn drain(&mut self) {
        while let Ok(event) = self.app_event_rx.try_recv() {
            self.output.push(match event {
                AppEvent::Dispatch(action) => ReplayOutput::Action { action },
                AppEvent::ScrollToBottom => ReplayOutput::ScrollToBottom,
            });
        }
        self.output.extend(
            self.widget
                .take_calls()
                .into_iter()
                .map(|call| ReplayOutput::Widget { call }),
        );
    }

    fn finish(mut self) -> Vec<ReplayOutput> {
        let mentions = self.area.mentions();
        let snapshot = StateSnapshot {
            conversation_id: self.area.conversation_id().clone(),
            text: self.area.text().to_string(),
            editing: self.area.is_editing(),
            user_popup_open: mentions.user_popup_open(),
            channel_popup_open: mentions.channel_popup_open(),
            mention_filter: mentions.mention_filter().to_string(),
            channel_mention_filter: mentions.channel_mention_filter().to_string(),
            pick_selected_counter: mentions.pick_selected_counter(),
            selection: mentions.selection(),
            drafts_cached: self.draft_cache.len(),
        };
        self.output.push(ReplayOutput::State(snapshot));
        self.output
    }
}

pub fn run_script(script: &str, settings: ComposerSettings) -> anyhow::Result<Vec<ReplayOutput>> {
    let mut replay: Option<Replay> = None;

    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }

        let event: HostEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("parse host event on line {line}"))?;
        tracing::debug!(line, ?event, "replaying host event");

        match replay.as_mut() {
            Some(active) => active
                .apply(line, event)
                .with_context(|| format!("apply host event on line {line}"))?,
            None => {
                let HostEvent::Props(props) = event else {
                    anyhow::bail!("line {line}: the first event must be `props`");
                };
                replay = Some(Replay::new(props, settings));
            }
        }
    }

    let Some(replay) = replay else {
        anyhow::bail!("script contains no events");
    };
    Ok(replay.finish())
}

/// Parse `enter`, `shift+enter`, `ctrl+a`, `x` and friends.
pub fn parse_key(spec: &str) -> anyhow::Result<KeyEvent> {
    let mut modifiers = KeyModifiers::NONE;
    let mut parts: Vec<&str> = spec.split('+').collect();
    let Some(name) = parts.pop() else {
        anyhow::bail!("empty key");
    };
    for modifier in parts {
        modifiers |= match modifier.to_ascii_lowercase().as_str() {
            "shift" => KeyModifiers::SHIFT,
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "alt" => KeyModifiers::ALT,
            other => anyhow::bail!("unknown key modifier `{other}` in `{spec}`"),
        };
    }

    let code = match name.to_ascii_lowercase().as_str() {
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        _ => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => anyhow::bail!("unknown key `{name}`"),
            }
        }
    };
    Ok(KeyEvent::new(code, modifiers))
}
