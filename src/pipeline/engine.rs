//! Execution engine: walks a pipeline's steps once, owning the run state.
//!
//! An [`Execution`] holds the current dataset and the ingest registry for a
//! single run. Each call to [`Execution::step`] applies exactly one step; the
//! first failure moves the run to [`RunStatus::Failed`] and nothing after it
//! is invoked.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

use super::core::Pipeline;
use super::ingests::Ingests;
use super::step::{Selection, Step, StepKind};
use crate::error::{BoxError, PipelineError, PipelineResult, StepError, StepFailure};
use crate::logging::LogLevel;

/// Lifecycle of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    NotStarted,
    Running { next_step: usize },
    Completed,
    /// `step` is `None` when the run failed for want of any dataset
    Failed { step: Option<String> },
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed { .. })
    }
}

pub struct Execution<'p, D> {
    pipeline: &'p Pipeline<D>,
    ingests: Ingests<D>,
    current: Option<D>,
    status: RunStatus,
}

impl<'p, D: Clone> Execution<'p, D> {
    pub(crate) fn new(pipeline: &'p Pipeline<D>) -> Self {
        Self {
            pipeline,
            ingests: Ingests::new(),
            current: None,
            status: RunStatus::NotStarted,
        }
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn ingests(&self) -> &Ingests<D> {
        &self.ingests
    }

    pub fn current(&self) -> Option<&D> {
        self.current.as_ref()
    }

    /// Final dataset of a completed run; `None` for any other state
    pub fn into_dataset(self) -> Option<D> {
        match self.status {
            RunStatus::Completed => self.current,
            _ => None,
        }
    }

    /// Apply the next step
    pub fn step(&mut self) -> PipelineResult<()> {
        let pipeline = self.pipeline;
        let logger = pipeline.logger();

        let index = match &self.status {
            RunStatus::NotStarted => {
                logger.log(
                    LogLevel::Info,
                    "Pipeline started",
                    &[("pipeline", &pipeline.name()), ("steps", &pipeline.len())],
                );
                0
            }
            RunStatus::Running { next_step } => *next_step,
            RunStatus::Completed | RunStatus::Failed { .. } => {
                return Err(PipelineError::RunFinished);
            }
        };

        let Some(step) = pipeline.steps().get(index) else {
            return self.finish();
        };

        debug!(
            "Processing step {}/{}: '{}' ({})",
            index + 1,
            pipeline.len(),
            step.name(),
            step.kind()
        );
        logger.log(
            LogLevel::Info,
            "Running step",
            &[("step", &step.name()), ("kind", &step.kind())],
        );

        if let Err(e) = self.apply(step) {
            return Err(self.fail(Some(step.name()), PipelineError::Step(e)));
        }

        debug!("Step '{}' processed successfully", step.name());
        self.status = RunStatus::Running {
            next_step: index + 1,
        };
        if index + 1 == pipeline.len() {
            return self.finish();
        }
        Ok(())
    }

    /// Apply steps until the run completes or fails
    pub fn run_to_completion(&mut self) -> PipelineResult<()> {
        while !self.status.is_terminal() {
            self.step()?;
        }
        Ok(())
    }

    fn apply(&mut self, step: &'p Step<D>) -> Result<(), StepError> {
        let kind = step.kind();
        match step {
            Step::Ingest { name, producer } => {
                let data = guard(name, kind, || producer())?;
                if self.current.is_none() {
                    debug!("Ingest '{}' seeds the current dataset", name);
                    self.current = Some(data.clone());
                }
                if self.ingests.insert(name.as_str(), data).is_some() {
                    debug!("Ingest '{}' replaced an earlier dataset", name);
                }
            }
            Step::Transform { name, func } => {
                let data = self.take_current(name, kind)?;
                let ingests = &self.ingests;
                let next = guard(name, kind, || func(data, ingests))?;
                self.current = Some(next);
            }
            Step::Condition { name, branches } => {
                let data = self.take_current(name, kind)?;
                let logger = self.pipeline.logger();
                let ingests = &self.ingests;

                let selection = guard(name, kind, || branches.select(&data, ingests))?;
                let next = match selection {
                    Selection::Branch { label, apply } => {
                        logger.log(
                            LogLevel::Info,
                            "Branch selected",
                            &[("step", name), ("branch", &label)],
                        );
                        guard(name, kind, || apply(data, ingests))?
                    }
                    Selection::Default(apply) => {
                        logger.log(
                            LogLevel::Info,
                            "No branch matched, applying default branch",
                            &[("step", name)],
                        );
                        guard(name, kind, || apply(data, ingests))?
                    }
                    Selection::PassThrough => {
                        logger.log(
                            LogLevel::Warning,
                            "No branch matched and no default branch, dataset unchanged",
                            &[("step", name)],
                        );
                        data
                    }
                };
                self.current = Some(next);
            }
            Step::Output { name, func } => {
                let data = self
                    .current
                    .as_ref()
                    .ok_or_else(|| StepError::missing_dataset(name.as_str(), kind))?;
                guard(name, kind, || func(data))?;
            }
        }
        Ok(())
    }

    fn take_current(&mut self, step: &str, kind: StepKind) -> Result<D, StepError> {
        self.current
            .take()
            .ok_or_else(|| StepError::missing_dataset(step, kind))
    }

    fn finish(&mut self) -> PipelineResult<()> {
        if self.current.is_none() {
            return Err(self.fail(None, PipelineError::NoDataset));
        }

        self.status = RunStatus::Completed;
        self.pipeline.logger().log(
            LogLevel::Success,
            "Pipeline completed",
            &[
                ("pipeline", &self.pipeline.name()),
                ("steps", &self.pipeline.len()),
            ],
        );
        Ok(())
    }

    fn fail(&mut self, step: Option<&str>, err: PipelineError) -> PipelineError {
        debug!("Pipeline '{}' failed: {}", self.pipeline.name(), err);
        self.status = RunStatus::Failed {
            step: step.map(str::to_string),
        };
        self.current = None;

        let logger = self.pipeline.logger();
        let pipeline = self.pipeline.name();
        match (step, &err) {
            (Some(step), PipelineError::Step(step_err)) => logger.log(
                LogLevel::Error,
                "Step failed",
                &[
                    ("pipeline", &pipeline),
                    ("step", &step),
                    ("error", &step_err.failure),
                ],
            ),
            _ => logger.log(
                LogLevel::Error,
                "Pipeline failed",
                &[("pipeline", &pipeline), ("error", &err)],
            ),
        }
        err
    }
}

/// Run a step function, turning both `Err` and panics into a `StepError`
fn guard<T>(
    step: &str,
    kind: StepKind,
    f: impl FnOnce() -> Result<T, BoxError>,
) -> Result<T, StepError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(StepError::failed(step, kind, source)),
        Err(payload) => Err(StepError::new(
            step,
            kind,
            StepFailure::Panicked(panic_message(payload.as_ref())),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
