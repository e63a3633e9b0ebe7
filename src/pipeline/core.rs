use tracing::{debug, warn};

use super::engine::Execution;
use super::ingests::Ingests;
use super::step::{Branches, Step};
use crate::error::{BoxError, PipelineError, PipelineResult};
use crate::logging::Logger;

/// An ordered sequence of named steps over a dataset of type `D`.
///
/// Steps run in insertion order. Building never executes anything; the run
/// happens in [`Pipeline::execute`] (or [`Pipeline::run`] / [`Pipeline::start`]),
/// which take `&self` so the step list can't change mid-run and the pipeline
/// can be executed again.
pub struct Pipeline<D> {
    name: String,
    steps: Vec<Step<D>>,
    logger: Logger,
}

impl<D: Clone> Pipeline<D> {
    pub fn new(name: impl Into<String>, logger: Logger) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            logger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn steps(&self) -> &[Step<D>] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append an already built step, validating it against the existing ones
    pub fn add_step(mut self, step: Step<D>) -> PipelineResult<Self> {
        match &step {
            Step::Ingest { name, .. } => {
                let duplicate = self
                    .steps
                    .iter()
                    .any(|s| matches!(s, Step::Ingest { name: existing, .. } if existing == name));
                if duplicate {
                    return Err(PipelineError::configuration(format!(
                        "Ingest '{}' is already defined in pipeline '{}'",
                        name, self.name
                    )));
                }
            }
            Step::Condition { name, branches } => {
                if let Some(label) = branches.duplicate_label() {
                    return Err(PipelineError::configuration(format!(
                        "Condition '{}' has more than one branch labelled '{}'",
                        name, label
                    )));
                }
            }
            Step::Transform { .. } | Step::Output { .. } => {}
        }

        self.push(step);
        Ok(self)
    }

    /// Add a step producing a named initial dataset
    pub fn create_ingest<F>(self, name: impl Into<String>, producer: F) -> PipelineResult<Self>
    where
        F: Fn() -> Result<D, BoxError> + Send + Sync + 'static,
    {
        self.add_step(Step::Ingest {
            name: name.into(),
            producer: Box::new(producer),
        })
    }

    /// Add a transform replacing the current dataset with `func`'s result
    pub fn pipe<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(D, &Ingests<D>) -> Result<D, BoxError> + Send + Sync + 'static,
    {
        self.push(Step::Transform {
            name: name.into(),
            func: Box::new(func),
        });
        self
    }

    /// Add a branching step; see [`Branches`] for selection rules
    pub fn condition(self, name: impl Into<String>, branches: Branches<D>) -> PipelineResult<Self> {
        self.add_step(Step::Condition {
            name: name.into(),
            branches,
        })
    }

    /// Add a side-effecting consumer of the current dataset
    pub fn output<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&D) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.push(Step::Output {
            name: name.into(),
            func: Box::new(func),
        });
        self
    }

    fn push(&mut self, step: Step<D>) {
        if step.name().is_empty() {
            warn!(
                "Adding unnamed {} step at position {} to pipeline '{}'",
                step.kind(),
                self.steps.len() + 1,
                self.name
            );
        }
        debug!(
            "Adding {} step '{}' to pipeline '{}'",
            step.kind(),
            step.name(),
            self.name
        );
        self.steps.push(step);
    }

    /// Begin a run that is driven one step at a time
    pub fn start(&self) -> Execution<'_, D> {
        Execution::new(self)
    }

    /// Run every step, returning the final dataset or the first error
    pub fn run(&self) -> PipelineResult<D> {
        debug!(
            "Executing pipeline '{}' with {} steps",
            self.name,
            self.steps.len()
        );
        let mut execution = self.start();
        execution.run_to_completion()?;
        execution.into_dataset().ok_or(PipelineError::NoDataset)
    }

    /// Run every step; `None` when any step failed.
    ///
    /// Failures are reported through the pipeline's logger at ERROR level and
    /// never returned to the caller.
    pub fn execute(&self) -> Option<D> {
        self.run().ok()
    }
}

impl<D> std::fmt::Debug for Pipeline<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .field("logger", &self.logger)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepKind;

    #[test]
    fn test_builder_records_steps_in_order() {
        let pipeline: Pipeline<i64> = Pipeline::new("order", Logger::noop())
            .create_ingest("load", || Ok(1))
            .unwrap()
            .pipe("inc", |d, _| Ok(d + 1))
            .condition("check", Branches::new())
            .unwrap()
            .output("print", |_| Ok(()));

        assert_eq!(pipeline.name(), "order");
        assert_eq!(pipeline.len(), 4);
        assert_eq!(pipeline.step_names(), vec!["load", "inc", "check", "print"]);
        let kinds: Vec<StepKind> = pipeline.steps().iter().map(Step::kind).collect();
        assert_eq!(
            kinds,
            vec![
                StepKind::Ingest,
                StepKind::Transform,
                StepKind::Condition,
                StepKind::Output
            ]
        );
    }

    #[test]
    fn test_duplicate_ingest_rejected() {
        let result = Pipeline::<i64>::new("dup", Logger::noop())
            .create_ingest("load", || Ok(1))
            .unwrap()
            .create_ingest("load", || Ok(2));

        match result {
            Err(PipelineError::Configuration(msg)) => assert!(msg.contains("'load'")),
            other => panic!("expected configuration error, got {:?}", other.map(|p| p.len())),
        }
    }

    #[test]
    fn test_transform_may_share_ingest_name() {
        let result = Pipeline::<i64>::new("shared", Logger::noop())
            .create_ingest("load", || Ok(1))
            .unwrap()
            .pipe("load", |d, _| Ok(d))
            .create_ingest("other", || Ok(2));
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_branch_label_rejected() {
        let branches = Branches::new()
            .when("x", |_: &i64, _: &Ingests<i64>| Ok(true), |d, _| Ok(d))
            .when("x", |_: &i64, _: &Ingests<i64>| Ok(false), |d, _| Ok(d));

        let result = Pipeline::new("branches", Logger::noop()).condition("pick", branches);
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_unnamed_steps_are_accepted() {
        let pipeline: Pipeline<i64> = Pipeline::new("", Logger::noop())
            .create_ingest("", || Ok(3))
            .unwrap()
            .pipe("", |d, _| Ok(d * 3));
        assert_eq!(pipeline.execute(), Some(9));
    }
}
