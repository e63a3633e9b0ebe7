//! Step model: the four step kinds and the ordered branch map of a condition.

use std::fmt;

use super::ingests::Ingests;
use crate::error::BoxError;

/// Produces an initial dataset
pub type Producer<D> = Box<dyn Fn() -> Result<D, BoxError> + Send + Sync>;

/// Maps the current dataset (plus the ingest registry) to a new one
pub type TransformFn<D> = Box<dyn Fn(D, &Ingests<D>) -> Result<D, BoxError> + Send + Sync>;

/// Decides whether a condition branch applies
pub type Predicate<D> = Box<dyn Fn(&D, &Ingests<D>) -> Result<bool, BoxError> + Send + Sync>;

/// Consumes the current dataset without changing it
pub type OutputFn<D> = Box<dyn Fn(&D) -> Result<(), BoxError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Ingest,
    Transform,
    Condition,
    Output,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Ingest => "ingest",
            StepKind::Transform => "transform",
            StepKind::Condition => "condition",
            StepKind::Output => "output",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub enum Step<D> {
    Ingest { name: String, producer: Producer<D> },
    Transform { name: String, func: TransformFn<D> },
    Condition { name: String, branches: Branches<D> },
    Output { name: String, func: OutputFn<D> },
}

impl<D> Step<D> {
    pub fn name(&self) -> &str {
        match self {
            Step::Ingest { name, .. }
            | Step::Transform { name, .. }
            | Step::Condition { name, .. }
            | Step::Output { name, .. } => name,
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Ingest { .. } => StepKind::Ingest,
            Step::Transform { .. } => StepKind::Transform,
            Step::Condition { .. } => StepKind::Condition,
            Step::Output { .. } => StepKind::Output,
        }
    }
}

impl<D> fmt::Debug for Step<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Step");
        s.field("kind", &self.kind()).field("name", &self.name());
        if let Step::Condition { branches, .. } = self {
            s.field("branches", &branches.labels().collect::<Vec<_>>())
                .field("default", &branches.has_default());
        }
        s.finish()
    }
}

struct Branch<D> {
    label: String,
    predicate: Predicate<D>,
    apply: TransformFn<D>,
}

/// Ordered `predicate -> branch` map of a condition step.
///
/// Predicates are evaluated in insertion order and the first one returning
/// `true` selects its branch. When none match, the `otherwise` branch runs if
/// one was given; otherwise the dataset passes through unchanged.
pub struct Branches<D> {
    branches: Vec<Branch<D>>,
    default: Option<TransformFn<D>>,
}

/// Outcome of evaluating a condition's predicates
pub enum Selection<'b, D> {
    Branch {
        label: &'b str,
        apply: &'b TransformFn<D>,
    },
    Default(&'b TransformFn<D>),
    PassThrough,
}

impl<D> Branches<D> {
    pub fn new() -> Self {
        Self {
            branches: Vec::new(),
            default: None,
        }
    }

    /// Add a labelled branch taken when `predicate` returns `true`
    pub fn when<P, F>(mut self, label: impl Into<String>, predicate: P, branch: F) -> Self
    where
        P: Fn(&D, &Ingests<D>) -> Result<bool, BoxError> + Send + Sync + 'static,
        F: Fn(D, &Ingests<D>) -> Result<D, BoxError> + Send + Sync + 'static,
    {
        self.branches.push(Branch {
            label: label.into(),
            predicate: Box::new(predicate),
            apply: Box::new(branch),
        });
        self
    }

    /// Set the branch applied when no predicate matches
    pub fn otherwise<F>(mut self, branch: F) -> Self
    where
        F: Fn(D, &Ingests<D>) -> Result<D, BoxError> + Send + Sync + 'static,
    {
        self.default = Some(Box::new(branch));
        self
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.branches.iter().map(|b| b.label.as_str())
    }

    /// First label that appears more than once
    pub(crate) fn duplicate_label(&self) -> Option<&str> {
        self.branches.iter().enumerate().find_map(|(i, branch)| {
            self.branches[..i]
                .iter()
                .any(|earlier| earlier.label == branch.label)
                .then_some(branch.label.as_str())
        })
    }

    /// Evaluate predicates in order, stopping at the first match
    pub fn select(&self, data: &D, ingests: &Ingests<D>) -> Result<Selection<'_, D>, BoxError> {
        for branch in &self.branches {
            if (branch.predicate)(data, ingests)? {
                return Ok(Selection::Branch {
                    label: &branch.label,
                    apply: &branch.apply,
                });
            }
        }

        Ok(match &self.default {
            Some(apply) => Selection::Default(apply),
            None => Selection::PassThrough,
        })
    }
}

impl<D> Default for Branches<D> {
    fn default() -> Self {
        Self::new()
    }
}
