/// Centralized error handling for simple-pipelines
pub mod config;
pub mod logging;
pub mod pipeline;

pub use config::{ConfigError, ConfigResult};
pub use logging::{SinkError, SinkResult};
pub use pipeline::{BoxError, PipelineError, PipelineResult, StepError, StepFailure};
