//! Runtime configuration.
//!
//! Values come from defaults, then `STUDYSMART_*` environment variables.
//! Blank variables count as unset.

use crate::logging::{default_log_level, init_logging, normalize_level, LoggingError};
use crate::presentation::ControllerSettings;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "STUDYSMART_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "STUDYSMART_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STUDYSMART_LOG_DIR";
pub const ENV_STOP_TIMEOUT_MS: &str = "STUDYSMART_STOP_TIMEOUT_MS";

const DEFAULT_DB_FILE: &str = "studysmart.sqlite3";
const DEFAULT_STOP_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off while unset.
    pub log_dir: Option<PathBuf>,
    pub state_stop_timeout_ms: u64,
    pub event_buffer: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            state_stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`, which maps a variable name to its
    /// raw value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = read(ENV_STOP_TIMEOUT_MS) {
            config.state_stop_timeout_ms =
                raw.parse().map_err(|err| ConfigError::InvalidValue {
                    key: ENV_STOP_TIMEOUT_MS,
                    value: raw.clone(),
                    reason: format!("{err}"),
                })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks values that may also come from deserialized input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(|err| ConfigError::InvalidValue {
            key: ENV_LOG_LEVEL,
            value: self.log_level.clone(),
            reason: err.to_string(),
        })?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOG_DIR,
                    value: dir.display().to_string(),
                    reason: "must be an absolute path".to_string(),
                });
            }
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_buffer",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            stop_timeout: Duration::from_millis(self.state_stop_timeout_ms),
            event_buffer: self.event_buffer,
        }
    }

    /// Starts file logging when `log_dir` is set. Returns whether logging
    /// was requested.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(dir) = &self.log_dir else {
            return Ok(false);
        };
        let dir = dir.to_str().ok_or_else(|| {
            LoggingError::InvalidLogDir(format!("not valid UTF-8: `{}`", dir.display()))
        })?;
        init_logging(&self.log_level, dir)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_LOG_DIR, ENV_STOP_TIMEOUT_MS};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, CoreConfig::default());
        let settings = config.controller_settings();
        assert_eq!(settings.stop_timeout, Duration::from_millis(5_000));
        assert_eq!(settings.event_buffer, 16);
    }

    #[test]
    fn variables_override_defaults_and_blank_means_unset() {
        let config = config_from(&[
            ("STUDYSMART_DB_PATH", " /data/study.db "),
            ("STUDYSMART_LOG_LEVEL", "warn"),
            ("STUDYSMART_LOG_DIR", "   "),
            ("STUDYSMART_STOP_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/data/study.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
        assert_eq!(config.state_stop_timeout_ms, 250);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config_from(&[("STUDYSMART_STOP_TIMEOUT_MS", "soon")]),
            Err(ConfigError::InvalidValue { key: ENV_STOP_TIMEOUT_MS, .. })
        ));
        assert!(matches!(
            config_from(&[("STUDYSMART_LOG_DIR", "relative/logs")]),
            Err(ConfigError::InvalidValue { key: ENV_LOG_DIR, .. })
        ));
        assert!(config_from(&[("STUDYSMART_LOG_LEVEL", "chatty")]).is_err());
    }

    #[test]
    fn deserializes_with_missing_fields_defaulted() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"db_path":"/tmp/a.db","event_buffer":4}"#).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/a.db"));
        assert_eq!(config.event_buffer, 4);
        assert_eq!(config.state_stop_timeout_ms, 5_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn logging_is_skipped_without_directory() {
        assert_eq!(CoreConfig::default().init_logging(), Ok(false));
    }
}
