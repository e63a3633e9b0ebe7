//! Logger configuration loaded from JSON

pub mod constants;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::logging::LogLevel;

/// Where published log lines go
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    #[default]
    Console,
    File {
        path: PathBuf,
    },
    RocketChat {
        url: String,
        user_id: String,
        access_token: String,
        channel: String,
    },
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default = "default_levels")]
    pub levels: Vec<LogLevel>,
}

fn default_levels() -> Vec<LogLevel> {
    constants::DEFAULT_LEVELS.to_vec()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            sink: SinkConfig::default(),
            levels: default_levels(),
        }
    }
}

impl LoggerConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: LoggerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        debug!("Loading logger config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn validate(&self) -> ConfigResult<()> {
        match &self.sink {
            SinkConfig::File { path } if path.as_os_str().is_empty() => {
                Err(ConfigError::invalid("file sink requires a non-empty path"))
            }
            SinkConfig::RocketChat { url, channel, .. } if url.is_empty() || channel.is_empty() => {
                Err(ConfigError::invalid(
                    "rocket_chat sink requires both url and channel",
                ))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = LoggerConfig::from_json("{}").unwrap();
        assert_eq!(config.sink, SinkConfig::Console);
        assert_eq!(config.levels, LogLevel::ALL.to_vec());
    }

    #[test]
    fn test_file_sink_with_levels() {
        let config = LoggerConfig::from_json(
            r#"{"sink": {"type": "file", "path": "logs/run.log"}, "levels": ["INFO", "ERROR"]}"#,
        )
        .unwrap();
        assert_eq!(
            config.sink,
            SinkConfig::File {
                path: PathBuf::from("logs/run.log")
            }
        );
        assert_eq!(config.levels, vec![LogLevel::Info, LogLevel::Error]);
    }

    #[test]
    fn test_rocket_chat_requires_url() {
        let err = LoggerConfig::from_json(
            r#"{"sink": {"type": "rocket_chat", "url": "", "user_id": "u", "access_token": "t", "channel": "c"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_sink_is_parse_error() {
        let err = LoggerConfig::from_json(r#"{"sink": {"type": "carrier_pigeon"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
