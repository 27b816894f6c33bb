//! Maps raw key names onto the three things a session cares about.

use vsearch_core::ResponseKey;

use crate::config::KeyConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Respond(ResponseKey),
    Advance,
    Ignored,
}

/// Canonical, lowercase name of a key. A literal `" "` and `"spacebar"`
/// both become `"space"`. Returns `None` for blank input.
pub fn normalize_key_name(raw: &str) -> Option<String> {
    if raw == " " {
        return Some("space".to_string());
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower == "spacebar" {
        return Some("space".to_string());
    }
    Some(lower)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMap {
    present: String,
    absent: String,
    advance: String,
}

impl InputMap {
    pub fn from_config(keys: &KeyConfig) -> Result<Self, ConfigError> {
        let norm = |raw: &String| {
            normalize_key_name(raw).ok_or_else(|| ConfigError::InvalidKey(raw.clone()))
        };
        Ok(Self {
            present: norm(&keys.target_present)?,
            absent: norm(&keys.target_absent)?,
            advance: norm(&keys.advance)?,
        })
    }

    pub fn classify(&self, raw: &str) -> KeyAction {
        let Some(key) = normalize_key_name(raw) else {
            return KeyAction::Ignored;
        };
        if key == self.present {
            KeyAction::Respond(ResponseKey::Present)
        } else if key == self.absent {
            KeyAction::Respond(ResponseKey::Absent)
        } else if key == self.advance {
            KeyAction::Advance
        } else {
            KeyAction::Ignored
        }
    }

    /// The name recorded in results for a response.
    pub fn key_name(&self, key: ResponseKey) -> &str {
        match key {
            ResponseKey::Present => &self.present,
            ResponseKey::Absent => &self.absent,
        }
    }
}
