//! Leveled logger with an allow-list of levels and a pluggable sink.
//!
//! A `Logger` formats `[LEVEL] message key: value | key: value` lines and hands
//! them to its [`Sink`]. Sink failures are reported through `tracing` and never
//! reach the caller of [`Logger::log`], so logging can't abort a pipeline.

pub mod sinks;
pub mod trace;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use crate::config::constants::{DEFAULT_LEVELS, FIELD_SEPARATOR};
use crate::config::{LoggerConfig, SinkConfig};
use crate::error::SinkResult;

pub use sinks::{ConsoleSink, FileSink, FnSink, NoopSink, RocketChatSink, Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Success,
    Error,
    Warning,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Info,
        LogLevel::Success,
        LogLevel::Error,
        LogLevel::Warning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

/// A named value appended to a log line
pub type Field<'a> = (&'a str, &'a dyn fmt::Display);

/// Format a log line the way every sink receives it
pub fn format_line(level: LogLevel, message: &str, fields: &[Field<'_>]) -> String {
    let joined = fields
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR);
    format!("[{level}] {message} {joined}").trim().to_string()
}

#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Sink>,
    levels: Vec<LogLevel>,
}

impl Logger {
    /// Create a logger publishing only the given levels
    pub fn new(sink: impl Sink + 'static, levels: impl Into<Vec<LogLevel>>) -> Self {
        Self {
            sink: Arc::new(sink),
            levels: levels.into(),
        }
    }

    /// Create a logger publishing every level
    pub fn with_sink(sink: impl Sink + 'static) -> Self {
        Self::new(sink, DEFAULT_LEVELS)
    }

    pub fn console() -> Self {
        Self::with_sink(ConsoleSink)
    }

    pub fn noop() -> Self {
        Self::new(NoopSink, Vec::new())
    }

    pub fn file(path: impl Into<PathBuf>) -> SinkResult<Self> {
        Ok(Self::with_sink(FileSink::new(path)?))
    }

    pub fn rocket_chat(
        url: impl Into<String>,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self::with_sink(RocketChatSink::new(url, user_id, access_token, channel))
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self::with_sink(FnSink::new(f))
    }

    pub fn from_config(config: &LoggerConfig) -> SinkResult<Self> {
        let levels = config.levels.clone();
        let logger = match &config.sink {
            SinkConfig::Console => Self::new(ConsoleSink, levels),
            SinkConfig::File { path } => Self::new(FileSink::new(path)?, levels),
            SinkConfig::RocketChat {
                url,
                user_id,
                access_token,
                channel,
            } => Self::new(
                RocketChatSink::new(url, user_id, access_token, channel),
                levels,
            ),
            SinkConfig::None => Self::noop(),
        };
        Ok(logger)
    }

    /// Replace the allow-list of levels
    pub fn with_levels(mut self, levels: impl Into<Vec<LogLevel>>) -> Self {
        self.levels = levels.into();
        self
    }

    pub fn levels(&self) -> &[LogLevel] {
        &self.levels
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.levels.contains(&level)
    }

    /// Publish a line if `level` is allowed, returning any sink failure
    pub fn try_log(&self, level: LogLevel, message: &str, fields: &[Field<'_>]) -> SinkResult<()> {
        if !self.is_enabled(level) {
            return Ok(());
        }
        self.sink.publish(&format_line(level, message, fields))
    }

    /// Publish a line if `level` is allowed. Sink failures are only traced.
    pub fn log(&self, level: LogLevel, message: &str, fields: &[Field<'_>]) {
        if let Err(e) = self.try_log(level, message, fields) {
            warn!("Failed to publish {} log line: {}", level, e);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, &[]);
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Success, message, &[]);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, &[]);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message, &[]);
    }

    pub fn info_with(&self, message: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Info, message, fields);
    }

    pub fn success_with(&self, message: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Success, message, fields);
    }

    pub fn error_with(&self, message: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Error, message, fields);
    }

    pub fn warning_with(&self, message: &str, fields: &[Field<'_>]) {
        self.log(LogLevel::Warning, message, fields);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::console()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}
