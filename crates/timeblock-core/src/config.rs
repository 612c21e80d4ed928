//! TOML-based application configuration.
//!
//! Stored at `~/.config/timeblock/config.toml`; the `TIMEBLOCK_CONFIG_DIR`
//! environment variable overrides the directory (tests use this). The file
//! is created with defaults on first load.

use std::path::PathBuf;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// IANA timezone every date computation is anchored to.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Calendar events land here.
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// Tasks in the list with this title are flagged as routines.
    #[serde(default = "default_routines_list")]
    pub routines_list: String,
    /// Scheduling fallback when duration inference finds nothing.
    #[serde(default = "default_duration_min")]
    pub default_duration_min: u32,
    /// Loopback port for the OAuth redirect.
    #[serde(default = "default_oauth_redirect_port")]
    pub oauth_redirect_port: u16,
}

fn default_timezone() -> String {
    "UTC".into()
}
fn default_calendar_id() -> String {
    "primary".into()
}
fn default_routines_list() -> String {
    "Routines".into()
}
fn default_duration_min() -> u32 {
    15
}
fn default_oauth_redirect_port() -> u16 {
    7391
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            calendar_id: default_calendar_id(),
            routines_list: default_routines_list(),
            default_duration_min: default_duration_min(),
            oauth_redirect_port: default_oauth_redirect_port(),
        }
    }
}

impl Config {
    /// Config directory: `$TIMEBLOCK_CONFIG_DIR`, or `~/.config/timeblock`.
    fn dir() -> Result<PathBuf, ConfigError> {
        let dir = match std::env::var_os("TIMEBLOCK_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
                .join("timeblock"),
        };
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        Ok(dir)
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first use.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// The parsed reference timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "timezone".into(),
                message: format!("'{}' is not a known IANA timezone", self.timezone),
            })
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key; the updated config is not saved here.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::ParseFailed("config is not a table".into()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Number(_) => {
                let n: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as a number"),
                })?;
                serde_json::Value::Number(n.into())
            }
            _ => serde_json::Value::String(value.to_string()),
        };
        obj.insert(key.to_string(), new_value);

        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        // Reject values the rest of the core would trip over later.
        if key == "timezone" {
            self.tz()?;
        }
        Ok(())
    }
}
