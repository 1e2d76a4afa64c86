//! Compiled pipeline types
//!
//! A [`Pipeline`] is the flat, ordered step sequence the compiler produces
//! and the interpreter walks. The same value serves both directions: in
//! reverse the steps are walked back to front and every path step swaps its
//! get/set orientation.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use crate::transformers::DataMapper;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Direction a pipeline is run in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Source to target
    Forward,
    /// Target to source
    Reverse,
}

impl Direction {
    pub fn is_rev(self) -> bool {
        self == Direction::Reverse
    }

    pub fn from_rev(rev: bool) -> Self {
        if rev {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "fwd"),
            Direction::Reverse => write!(f, "rev"),
        }
    }
}

/// What a primitive path step addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKind {
    /// Object member; a slashed member only acts when it is a get
    Prop { key: String, slashed: bool },
    /// List position, negative counts from the end
    Index(i64),
    /// `[]`: make sure the value is a list
    Array,
    /// `^`: step back to the previous value on the context stack
    Parent,
    /// `^^`: jump to the bottom of the context stack
    Root,
    /// `|`: discard the pipeline's effect
    Plug,
    /// `$modify`: shallow-merge marker closing a mutation sub-pipeline
    Modify,
}

/// A primitive path step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub kind: PathKind,
    /// Compiled with set orientation (`>`)
    pub set: bool,
}

impl PathStep {
    pub fn get(kind: PathKind) -> Self {
        Self { kind, set: false }
    }

    pub fn set(kind: PathKind) -> Self {
        Self { kind, set: true }
    }

    pub fn prop(key: impl Into<String>) -> Self {
        Self::get(PathKind::Prop {
            key: key.into(),
            slashed: false,
        })
    }

    /// Whether the step writes when walked in the given direction
    pub fn is_set(&self, rev: bool) -> bool {
        self.set != rev
    }

    /// Whether the step moves one level into the target when setting
    pub fn descends(&self) -> bool {
        matches!(self.kind, PathKind::Prop { .. } | PathKind::Index(_))
    }

    pub fn is_array_marker(&self) -> bool {
        self.kind == PathKind::Array
    }

    /// The same step with the opposite orientation
    pub fn flipped(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            set: !self.set,
        }
    }
}

/// A transform function bound to its configuration
#[derive(Clone)]
pub struct TransformStep {
    pub name: String,
    pub mapper: DataMapper,
}

impl fmt::Debug for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformStep")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Kind-specific payload of an operation step
#[derive(Debug, Clone)]
pub enum OperationKind {
    /// Build an object; each sub-pipeline ends in the set step of one member
    Mutation {
        pipelines: Vec<Pipeline>,
        no_defaults: bool,
    },
    /// Call a transform function
    Transform(TransformStep),
    /// Run a named pipeline from the registry
    Apply { id: String },
    /// First alternative yielding a value wins
    Alt { pipelines: Vec<Pipeline> },
    /// Positional slots of a list
    Array { pipelines: Vec<Pipeline> },
    /// Branch on a condition evaluated forward
    If {
        condition: Pipeline,
        then: Pipeline,
        otherwise: Pipeline,
    },
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Mutation { .. } => "mutation",
            OperationKind::Transform(_) => "transform",
            OperationKind::Apply { .. } => "apply",
            OperationKind::Alt { .. } => "alt",
            OperationKind::Array { .. } => "array",
            OperationKind::If { .. } => "if",
        }
    }
}

/// An operation step with its direction restriction and flags
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    /// Only run in this direction; pass the value through otherwise
    pub direction: Option<Direction>,
    /// Run once per item when the value is a list
    pub iterate: bool,
    /// Invert the direction of this operation's sub-pipelines
    pub flip: bool,
}

impl Operation {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            direction: None,
            iterate: false,
            flip: false,
        }
    }

    /// Whether the direction restriction lets the operation run
    pub fn applies_to(&self, rev: bool) -> bool {
        self.direction.map_or(true, |d| d.is_rev() == rev)
    }
}

/// One step of a compiled pipeline
#[derive(Debug, Clone)]
pub enum Step {
    Path(PathStep),
    Operation(Operation),
}

impl Step {
    pub fn as_path(&self) -> Option<&PathStep> {
        match self {
            Step::Path(path) => Some(path),
            Step::Operation(_) => None,
        }
    }

    pub fn as_operation_mut(&mut self) -> Option<&mut Operation> {
        match self {
            Step::Operation(op) => Some(op),
            Step::Path(_) => None,
        }
    }

    /// A path step that writes in the given direction
    pub fn is_set(&self, rev: bool) -> bool {
        self.as_path().is_some_and(|p| p.is_set(rev))
    }
}

impl From<PathStep> for Step {
    fn from(step: PathStep) -> Self {
        Step::Path(step)
    }
}

impl From<Operation> for Step {
    fn from(op: Operation) -> Self {
        Step::Operation(op)
    }
}

/// An immutable, shareable step sequence
#[derive(Clone, Default)]
pub struct Pipeline(Arc<[Step]>);

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps.into())
    }

    /// Whether any step writes into the target in the given direction
    pub fn sets_in(&self, rev: bool) -> bool {
        self.iter().any(|step| {
            step.as_path()
                .is_some_and(|p| p.is_set(rev) && (p.descends() || p.kind == PathKind::Modify))
        })
    }

    /// The direction restriction of a pipeline made of a single operation
    pub fn direction(&self) -> Option<Direction> {
        match &self[..] {
            [Step::Operation(op)] => op.direction,
            _ => None,
        }
    }

    /// Path part of a sub-pipeline closed by the modify marker
    pub fn modify_path(&self) -> Option<&[Step]> {
        match self.split_last() {
            Some((Step::Path(last), rest)) if last.kind == PathKind::Modify => Some(rest),
            _ => None,
        }
    }
}

impl Deref for Pipeline {
    type Target = [Step];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Step>> for Pipeline {
    fn from(steps: Vec<Step>) -> Self {
        Self::new(steps)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_swaps_with_direction() {
        let get = PathStep::prop("a");
        let set = get.flipped();

        assert!(!get.is_set(false));
        assert!(get.is_set(true));
        assert!(set.is_set(false));
        assert!(!set.is_set(true));
    }

    #[test]
    fn test_modify_path_splits_marker() {
        let pipeline = Pipeline::new(vec![
            PathStep::prop("meta").into(),
            PathStep::set(PathKind::Modify).into(),
        ]);
        let path = pipeline.modify_path().unwrap();
        assert_eq!(path.len(), 1);
        assert!(Pipeline::new(vec![PathStep::prop("a").into()]).modify_path().is_none());
    }

    #[test]
    fn test_sets_in_ignores_markers() {
        let pipeline = Pipeline::new(vec![
            PathStep::prop("a").into(),
            PathStep::set(PathKind::Array).into(),
        ]);
        assert!(!pipeline.sets_in(false));
        assert!(pipeline.sets_in(true));
    }
}
