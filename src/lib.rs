//! In-process data pipeline executor.
//!
//! A [`Pipeline`] chains named steps over one evolving dataset: ingests seed
//! it, transforms replace it, conditions pick one of several transforms and
//! outputs consume it. The first failing step stops the run and
//! [`Pipeline::execute`] yields `None`; progress is reported through an
//! injected [`Logger`].

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use config::{LoggerConfig, SinkConfig};
pub use error::{BoxError, PipelineError, PipelineResult, SinkError, StepError, StepFailure};
pub use logging::{LogLevel, Logger, Sink};
pub use pipeline::{Branches, Execution, Ingests, Pipeline, RunStatus, Step, StepKind};
