//! Publish targets for formatted log lines

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::constants::ROCKET_CHAT_POST_PATH;
use crate::error::{SinkError, SinkResult};

/// Receives one fully formatted log line
pub trait Sink: Send + Sync {
    fn publish(&self, line: &str) -> SinkResult<()>;
}

/// Prints lines to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn publish(&self, line: &str) -> SinkResult<()> {
        println!("{line}");
        Ok(())
    }
}

/// Discards every line
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn publish(&self, _line: &str) -> SinkResult<()> {
        Ok(())
    }
}

/// Appends lines to a UTF-8 file, one per line
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Create the sink, making sure the parent directory exists
    pub fn new(path: impl Into<PathBuf>) -> SinkResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn publish(&self, line: &str) -> SinkResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format!("{line}\n").as_bytes())?;
        Ok(())
    }
}

/// Posts lines to a Rocket.Chat room
pub struct RocketChatSink {
    url: String,
    user_id: String,
    access_token: String,
    channel: String,
    client: reqwest::blocking::Client,
}

impl RocketChatSink {
    pub fn new(
        url: impl Into<String>,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self::with_client(
            url,
            user_id,
            access_token,
            channel,
            reqwest::blocking::Client::new(),
        )
    }

    /// Use a preconfigured HTTP client (proxy, timeouts, TLS)
    pub fn with_client(
        url: impl Into<String>,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        channel: impl Into<String>,
        client: reqwest::blocking::Client,
    ) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            access_token: access_token.into(),
            channel: channel.into(),
            client,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.url, ROCKET_CHAT_POST_PATH)
    }
}

impl std::fmt::Debug for RocketChatSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocketChatSink")
            .field("url", &self.url)
            .field("user_id", &self.user_id)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl Sink for RocketChatSink {
    fn publish(&self, line: &str) -> SinkResult<()> {
        let endpoint = self.endpoint();
        debug!("Posting log line to {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .header("X-Auth-Token", &self.access_token)
            .header("X-User-Id", &self.user_id)
            .form(&[("roomId", self.channel.as_str()), ("text", line)])
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SinkError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

/// Forwards lines to a closure
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Sink for FnSink<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn publish(&self, line: &str) -> SinkResult<()> {
        (self.0)(line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_creates_parent_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/pipeline.log");

        let sink = FileSink::new(&path).unwrap();
        assert!(path.parent().unwrap().is_dir());

        sink.publish("[INFO] first").unwrap();
        sink.publish("[ERROR] second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "[INFO] first\n[ERROR] second\n");
    }

    #[test]
    fn test_file_sink_bare_file_name() {
        let sink = FileSink::new("only-a-name.log").unwrap();
        assert_eq!(sink.path(), Path::new("only-a-name.log"));
    }

    #[test]
    fn test_rocket_chat_endpoint() {
        let sink = RocketChatSink::new("https://chat.example.com/", "uid", "token", "GENERAL");
        assert_eq!(
            sink.endpoint(),
            "https://chat.example.com/api/v1/chat.postMessage"
        );
    }
}
