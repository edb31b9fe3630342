use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// User-authored text that must never show up in logs.
///
/// `Debug` and `Display` are redacted; use [`HiddenString::reveal`] at the
/// point where the text is actually needed. Serialization is transparent so the
/// action bus still receives the real payload.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HiddenString(String);

impl HiddenString {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }

}

impl From<String> for HiddenString {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for HiddenString {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Debug for HiddenString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HiddenString(len={})", self.0.len())
    }
}

impl fmt::Display for HiddenString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[HiddenString]")
    }
}
