//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Phase durations and the long-break interval
//! - Sound cues and optional custom sound files
//! - Notification, statistics and pause-after-work flags
//! - Interface language
//!
//! Configuration is stored at `~/.config/tomatotock/config.toml`.
//! The session engine never reads this file; it receives a [`Settings`]
//! snapshot built by [`Config::settings`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{Durations, Settings};

/// Phase durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersConfig {
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_short_rest")]
    pub short_rest: u32,
    #[serde(default = "default_long_rest")]
    pub long_rest: u32,
}

/// Sound configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundsConfig {
    /// Start and completion cues.
    #[serde(default = "default_true")]
    pub enable_completion: bool,
    /// Looping tick cue during work.
    #[serde(default = "default_true")]
    pub enable_ticking: bool,
    /// Paths to custom WAV files. Empty means the built-in cue.
    #[serde(default)]
    pub custom_start: String,
    #[serde(default)]
    pub custom_tick: String,
    #[serde(default)]
    pub custom_complete: String,
}

/// Session behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default)]
    pub pause_after_work: bool,
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    #[serde(default)]
    pub enable_stats: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tomatotock/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timers: TimersConfig,
    #[serde(default)]
    pub sounds: SoundsConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

// Default functions
fn default_work() -> u32 {
    25 * 60
}
fn default_short_rest() -> u32 {
    5 * 60
}
fn default_long_rest() -> u32 {
    15 * 60
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "en".into()
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            work: default_work(),
            short_rest: default_short_rest(),
            long_rest: default_long_rest(),
        }
    }
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            enable_completion: true,
            enable_ticking: true,
            custom_start: String::new(),
            custom_tick: String::new(),
            custom_complete: String::new(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            long_break_interval: default_long_break_interval(),
            pause_after_work: false,
            enable_notifications: true,
            enable_stats: false,
            language: default_language(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u32>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot replace a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Location of the config file, creating its directory if needed.
    pub fn file_path() -> Result<PathBuf, ConfigError> {
        Self::path()
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there when it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only. The result is validated
    /// before it replaces `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject durations and intervals below 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("timers.work", self.timers.work),
            ("timers.short_rest", self.timers.short_rest),
            ("timers.long_rest", self.timers.long_rest),
            ("general.long_break_interval", self.general.long_break_interval),
        ];
        for (key, value) in checks {
            if value < 1 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1".into(),
                });
            }
        }
        Ok(())
    }

    /// Engine-facing snapshot.
    pub fn settings(&self) -> Settings {
        Settings {
            durations: Durations {
                work: self.timers.work,
                short_rest: self.timers.short_rest,
                long_rest: self.timers.long_rest,
            },
            long_break_interval: self.general.long_break_interval,
            pause_after_work: self.general.pause_after_work,
            enable_completion_sound: self.sounds.enable_completion,
            enable_ticking_sound: self.sounds.enable_ticking,
            enable_notifications: self.general.enable_notifications,
            enable_stats: self.general.enable_stats,
        }
    }
}
