use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chat_input_tui::ComposerSettings;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;
use toml_edit::Value as TomlValue;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve composer settings. Keys that are missing or malformed keep their
    /// defaults; a missing file yields [`ComposerSettings::default`].
    pub fn composer_settings(&self) -> anyhow::Result<ComposerSettings> {
        let mut settings = ComposerSettings::default();
        let Some(content) = read_config_text(&self.path)? else {
            return Ok(settings);
        };

        let values = match content.parse::<DocumentMut>() {
            Ok(doc) => SettingValues::from_document(&doc),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "config.toml is not valid TOML, using line-based fallback: {err}"
                );
                SettingValues::from_fallback(&content)
            }
        };

        if let Some(exclusive) = values.exclusive_popups {
            settings.exclusive_mention_popups = exclusive;
        }
        if let Some(notifications) = values.typing_notifications {
            settings.typing_notifications = notifications;
        }
        match values.typing_throttle_ms {
            Some(ms) if ms >= 0 => {
                settings.typing_throttle = Duration::from_millis(ms.unsigned_abs());
            }
            Some(ms) => {
                tracing::warn!(throttle_ms = ms, "ignoring negative typing.throttle_ms");
            }
            None => {}
        }
        Ok(settings)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct SettingValues {
    exclusive_popups: Option<bool>,
    typing_notifications: Option<bool>,
    typing_throttle_ms: Option<i64>,
}

impl SettingValues {
    fn from_document(doc: &DocumentMut) -> Self {
        Self {
            exclusive_popups: read_table_value(doc, "mentions", "exclusive_popups")
                .and_then(TomlValue::as_bool),
            typing_notifications: read_table_value(doc, "typing", "notifications")
                .and_then(TomlValue::as_bool),
            typing_throttle_ms: read_table_value(doc, "typing", "throttle_ms")
                .and_then(TomlValue::as_integer),
        }
    }

    fn from_fallback(contents: &str) -> Self {
        Self {
            exclusive_popups: parse_table_token_fallback(contents, "mentions", "exclusive_popups")
                .and_then(parse_bool_token),
            typing_notifications: parse_table_token_fallback(contents, "typing", "notifications")
                .and_then(parse_bool_token),
            typing_throttle_ms: parse_table_token_fallback(contents, "typing", "throttle_ms")
                .and_then(|token| token.replace('_', "").parse().ok()),
        }
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".chat-input").join("config.toml")
}

fn read_table_value<'a>(doc: &'a DocumentMut, table: &str, key: &str) -> Option<&'a TomlValue> {
    doc.get(table)
        .and_then(TomlItem::as_table)
        .and_then(|table| table.get(key))
        .and_then(TomlItem::as_value)
}

fn parse_bool_token(token: &str) -> Option<bool> {
    match token {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Last value of `key` inside `[table]`, as its first whitespace-separated token.
fn parse_table_token_fallback<'a>(contents: &'a str, table: &str, key: &str) -> Option<&'a str> {
    let mut in_table = false;
    let mut result = None;

    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            in_table = parse_table_header_name(trimmed) == Some(table);
            continue;
        }

        if !in_table {
            continue;
        }

        let Some(line) = uncommented(trimmed) else {
            continue;
        };
        let Some((line_key, value)) = line.split_once('=') else {
            continue;
        };
        if line_key.trim() != key {
            continue;
        }

        if let Some(token) = value.split_whitespace().next() {
            result = Some(token);
        }
    }

    result
}

/// `[name]` -> `name`. Array-of-tables headers and broken headers yield `None`
/// or a name that never matches a settings table.
fn parse_table_header_name(line: &str) -> Option<&str> {
    let (name, _) = line.trim_start().strip_prefix('[')?.split_once(']')?;
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

/// The part of `line` before any `#`, trimmed; `None` when nothing remains.
fn uncommented(line: &str) -> Option<&str> {
    let code = line.find('#').map_or(line, |idx| &line[..idx]).trim();
    (!code.is_empty()).then_some(code)
}

fn read_config_text(path: &Path) -> anyhow::Result<Option<String>> {
    std::fs::read_to_string(path).map(Some).or_else(|err| {
        if err.kind() == ErrorKind::NotFound {
            Ok(None)
        } else {
            Err(err).with_context(|| format!("read {}", path.display()))
        }
    })
}
