/// Pipeline construction and execution error types
use thiserror::Error;

use crate::pipeline::StepKind;

/// Error type returned by user-supplied step functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a single step did not complete
#[derive(Error, Debug)]
pub enum StepFailure {
    #[error(transparent)]
    Failed(BoxError),
    #[error("step panicked: {0}")]
    Panicked(String),
    #[error("no dataset has been ingested yet")]
    MissingDataset,
}

/// A step that failed during a run, with the step it came from
#[derive(Error, Debug)]
#[error("{kind} step '{step}' failed: {failure}")]
pub struct StepError {
    pub step: String,
    pub kind: StepKind,
    #[source]
    pub failure: StepFailure,
}

impl StepError {
    pub fn new(step: impl Into<String>, kind: StepKind, failure: StepFailure) -> Self {
        Self {
            step: step.into(),
            kind,
            failure,
        }
    }

    pub fn failed(step: impl Into<String>, kind: StepKind, source: BoxError) -> Self {
        Self::new(step, kind, StepFailure::Failed(source))
    }

    pub fn missing_dataset(step: impl Into<String>, kind: StepKind) -> Self {
        Self::new(step, kind, StepFailure::MissingDataset)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error("Pipeline finished without ingesting a dataset")]
    NoDataset,
    #[error("Pipeline run has already finished")]
    RunFinished,
}

impl PipelineError {
    /// Create a new Configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Name of the failing step, if the error came from one
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Self::Step(err) => Some(&err.step),
            _ => None,
        }
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
