//! Constants for simple-pipelines

use crate::logging::LogLevel;

/// Levels published when no allow-list is given
pub const DEFAULT_LEVELS: &[LogLevel] = &LogLevel::ALL;

/// Separator between `key: value` fields in a published log line
pub const FIELD_SEPARATOR: &str = " | ";

/// Rocket.Chat REST endpoint for posting a message
pub const ROCKET_CHAT_POST_PATH: &str = "/api/v1/chat.postMessage";

/// Diagnostic trace log written by the binary
pub const TRACE_LOG_FILE: &str = "simple-pipelines.log";
