//! # User Settings
//!
//! Read-only snapshot of the user preferences the soundboard consults when a
//! key is pressed, plus JSON persistence.
//!
//! Stored settings are merged over the defaults key by key, so a file written
//! by an older version (missing newer keys) still loads. An explicit `null`
//! for `maxTimeMs` means "no cap" and is kept distinct from a missing key.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error};

/// How a key press treats the sound's previous position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Every press starts from the beginning
    #[default]
    Restart,
    /// A press continues where the last release of the same sound stopped
    Resume,
    /// Like `Restart`; the host additionally chains sounds
    Autoplay,
}

/// User preferences snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Card category shown by the host, if chosen
    pub card_mode: Option<String>,
    pub shuffle_mode: bool,
    pub primary_color: String,
    pub secondary_color: String,
    /// Maximum time a press may sound, `None` for unlimited
    pub max_time_ms: Option<u64>,
    pub playback_mode: PlaybackMode,
    /// `true` once the user saved settings at least once
    pub has_settings: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            card_mode: None,
            shuffle_mode: true,
            primary_color: "#39ff14".to_string(),
            secondary_color: "#ff0000".to_string(),
            max_time_ms: Some(5000),
            playback_mode: PlaybackMode::Restart,
            has_settings: false,
        }
    }
}

impl UserSettings {
    /// Parse stored settings, merged over the defaults.
    ///
    /// Unparsable input is logged and yields the defaults.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Value>(json) {
            Ok(Value::Object(stored)) => Self::default().merged(stored),
            Ok(other) => {
                error!(kind = ?other, "Stored settings are not a JSON object");
                Self::default()
            }
            Err(e) => {
                error!(error = %e, "Error parsing stored settings");
                Self::default()
            }
        }
    }

    /// Apply a partial update (for example `{"playbackMode": "resume"}`).
    pub fn apply(&self, changes: Value) -> Self {
        match changes {
            Value::Object(map) => self.clone().merged(map),
            other => {
                error!(kind = ?other, "Settings update is not a JSON object");
                self.clone()
            }
        }
    }

    fn merged(self, overrides: Map<String, Value>) -> Self {
        let Ok(Value::Object(mut base)) = serde_json::to_value(&self) else {
            return self;
        };
        for (key, value) in overrides {
            base.insert(key, value);
        }
        base.insert("hasSettings".to_string(), Value::Bool(true));

        match serde_json::from_value(Value::Object(base)) {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "Stored settings have invalid values");
                self
            }
        }
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Press duration cap.
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_time_ms.map(Duration::from_millis)
    }
}

/// JSON file holding the persisted [`UserSettings`].
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/soundboard/settings.json`
    pub fn default_location() -> Self {
        let dir = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(dir.join("soundboard").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing file yields the defaults.
    pub fn load(&self) -> Result<UserSettings> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(UserSettings::from_json(&json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No stored settings, using defaults");
                Ok(UserSettings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist settings, creating parent directories as needed.
    pub fn save(&self, settings: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, settings.to_json()?)?;
        debug!(path = ?self.path, "Saved settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = UserSettings::default();
        assert_eq!(settings.card_mode, None);
        assert!(settings.shuffle_mode);
        assert_eq!(settings.primary_color, "#39ff14");
        assert_eq!(settings.secondary_color, "#ff0000");
        assert_eq!(settings.max_time_ms, Some(5000));
        assert_eq!(settings.playback_mode, PlaybackMode::Restart);
        assert!(!settings.has_settings);
    }

    #[test]
    fn test_from_json_merges_over_defaults() {
        let settings = UserSettings::from_json(r#"{"playbackMode":"resume","cardMode":"animals"}"#);
        assert_eq!(settings.playback_mode, PlaybackMode::Resume);
        assert_eq!(settings.card_mode.as_deref(), Some("animals"));
        assert_eq!(settings.primary_color, "#39ff14");
        assert_eq!(settings.max_time_ms, Some(5000));
        assert!(settings.has_settings);
    }

    #[test]
    fn test_explicit_null_max_time_is_unlimited() {
        let settings = UserSettings::from_json(r#"{"maxTimeMs":null}"#);
        assert_eq!(settings.max_time_ms, None);
        assert_eq!(settings.max_duration(), None);
    }

    #[test]
    fn test_invalid_json_yields_defaults() {
        assert_eq!(UserSettings::from_json("{not json"), UserSettings::default());
        assert_eq!(UserSettings::from_json("[1,2]"), UserSettings::default());
        assert_eq!(
            UserSettings::from_json(r#"{"playbackMode":"shuffle"}"#),
            UserSettings::default()
        );
    }

    #[test]
    fn test_apply_partial_update() {
        let updated = UserSettings::default().apply(json!({ "maxTimeMs": 1500 }));
        assert_eq!(updated.max_duration(), Some(Duration::from_millis(1500)));
        assert!(updated.has_settings);
    }

    #[test]
    fn test_settings_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::new(dir.path().join("nested").join("settings.json"));

        assert_eq!(file.load().unwrap(), UserSettings::default());

        let settings = UserSettings::default().apply(json!({ "playbackMode": "autoplay" }));
        file.save(&settings).unwrap();
        assert_eq!(file.load().unwrap(), settings);
    }
}
