//! Run state threaded through the interpreter
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use super::{Pipeline, Registry};
use crate::error::{Error, Result};
use crate::value::Value;
use std::sync::Arc;

/// Read-only data shared by every frame of every run
#[derive(Debug, Clone, Default)]
pub struct Shared {
    /// Named pipelines reachable through `$apply`
    pub pipelines: Registry,
    /// Values treated as "no result"
    pub nonvalues: Vec<Value>,
}

impl Shared {
    pub fn new(pipelines: Registry, nonvalues: Vec<Value>) -> Self {
        Self {
            pipelines,
            nonvalues,
        }
    }
}

/// State of one interpreter frame
///
/// A frame owns its context stack. Handlers and array hand-off derive new
/// frames with a cloned stack instead of sharing the caller's, so nothing a
/// sub-pipeline pushes or pops escapes into its siblings.
#[derive(Debug, Clone)]
pub struct State {
    /// Ancestors of the current value, consulted by `^` and `^^`
    pub context: Vec<Value>,
    /// Running in reverse
    pub rev: bool,
    /// Parity of the flips between the run entry and this frame
    pub flip: bool,
    /// Existing structure set steps merge into
    pub target: Option<Value>,
    /// Skip writing undefined values and defaulting to empty lists
    pub no_defaults: bool,
    /// Position of the current item while iterating a list
    pub index: Option<usize>,
    /// Target unwind stack of the running pipeline
    pub(crate) levels: Vec<Value>,
    shared: Arc<Shared>,
}

impl State {
    pub fn new(shared: Arc<Shared>, rev: bool) -> Self {
        Self {
            context: Vec::new(),
            rev,
            flip: false,
            target: None,
            no_defaults: false,
            index: None,
            levels: Vec::new(),
            shared,
        }
    }

    pub fn with_target(mut self, target: Option<Value>) -> Self {
        self.target = target;
        self
    }

    pub fn with_no_defaults(mut self, no_defaults: bool) -> Self {
        self.no_defaults = no_defaults;
        self
    }

    /// True when the run as a whole goes in reverse, ignoring local flips
    pub fn run_is_rev(&self) -> bool {
        self.rev != self.flip
    }

    /// A new frame sharing this frame's context, without a target
    pub fn child(&self) -> State {
        State {
            context: self.context.clone(),
            rev: self.rev,
            flip: self.flip,
            target: None,
            no_defaults: self.no_defaults,
            index: self.index,
            levels: Vec::new(),
            shared: Arc::clone(&self.shared),
        }
    }

    /// A child frame for an operation, with its flip applied
    pub fn operation_frame(&self, flip: bool) -> State {
        let mut frame = self.child();
        if flip {
            frame.rev = !frame.rev;
            frame.flip = !frame.flip;
        }
        frame
    }

    /// A child frame running forward, used for conditions
    pub fn forward_frame(&self) -> State {
        let mut frame = self.child();
        if frame.rev {
            frame.rev = false;
            frame.flip = !frame.flip;
        }
        frame
    }

    /// A frame for one item of a list, with its own unwind levels
    pub(crate) fn item_frame(&self, index: usize, levels: Vec<Value>) -> State {
        State {
            context: self.context.clone(),
            rev: self.rev,
            flip: self.flip,
            target: None,
            no_defaults: self.no_defaults,
            index: Some(index),
            levels,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Existing value at the current set depth
    pub fn target_peek(&self) -> Value {
        self.levels.last().cloned().unwrap_or_default()
    }

    pub(crate) fn has_levels(&self) -> bool {
        !self.levels.is_empty()
    }

    pub fn is_nonvalue(&self, value: &Value) -> bool {
        self.shared.nonvalues.iter().any(|nonvalue| nonvalue == value)
    }

    pub fn pipelines(&self) -> &Registry {
        &self.shared.pipelines
    }

    /// Resolve a named pipeline
    pub fn pipeline(&self, id: &str) -> Result<Pipeline> {
        self.shared
            .pipelines
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PipelineNotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> State {
        State::new(Arc::new(Shared::new(Registry::new(), vec![Value::Undefined])), false)
    }

    #[test]
    fn test_child_clones_context() {
        let mut parent = state().with_target(Some(Value::from(json!({ "a": 1 }))));
        parent.context.push(Value::from("root"));

        let mut child = parent.child();
        child.context.push(Value::from("inner"));

        assert_eq!(parent.context.len(), 1);
        assert_eq!(child.context.len(), 2);
        assert!(child.target.is_none());
    }

    #[test]
    fn test_flip_keeps_run_direction() {
        let parent = state();
        let flipped = parent.operation_frame(true);
        assert!(flipped.rev);
        assert!(!flipped.run_is_rev());

        let condition = flipped.forward_frame();
        assert!(!condition.rev);
        assert!(!condition.run_is_rev());
    }

    #[test]
    fn test_unknown_pipeline_names_id() {
        let err = state().pipeline("comment").unwrap_err();
        assert!(matches!(err, Error::PipelineNotFound { ref id } if id == "comment"));
    }

    #[test]
    fn test_nonvalues() {
        let state = state();
        assert!(state.is_nonvalue(&Value::Undefined));
        assert!(!state.is_nonvalue(&Value::Null));
    }
}
