// Pipeline module: step model, ingest registry, builder and execution engine

pub mod core;
pub mod engine;
pub mod ingests;
pub mod step;

pub use crate::error::{BoxError, PipelineError, PipelineResult, StepError, StepFailure};
pub use self::core::Pipeline;
pub use engine::{Execution, RunStatus};
pub use ingests::Ingests;
pub use step::{Branches, OutputFn, Predicate, Producer, Selection, Step, StepKind, TransformFn};
