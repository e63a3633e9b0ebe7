/// Log sink error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to send log message to Rocket.Chat channel: {status}")]
    Status { status: u16 },
}

pub type SinkResult<T> = Result<T, SinkError>;
