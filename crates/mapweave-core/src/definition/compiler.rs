//! Definition compiler
//!
//! Compiles a definition into a flat [`Pipeline`]:
//!
//! - a string is a path
//! - a list compiles each item and concatenates the steps
//! - an object is an operator (after shorthand expansion) or, failing
//!   that, a mutation whose keys name the properties to set
//!
//! Named pipelines are compiled lazily. `$apply` only records the id on a
//! worklist, and [`Compiler::into_registry`] compiles the ids that were
//! reached, each exactly once, so recursive pipelines terminate.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use super::{json_kind, path, shorthand};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::pipeline::{Operation, OperationKind, PathKind, PathStep, Pipeline, Registry, Step, TransformStep};
use crate::transformers::Props;
use serde_json::Value as Json;
use std::collections::HashSet;
use tracing::debug;

/// Mutation keys with a meaning of their own
const CONTROL_KEYS: [&str; 5] = ["$modify", "$flip", "$iterate", "$noDefaults", "$direction"];

/// Compiles definitions against a set of options
pub struct Compiler<'o> {
    options: &'o Options,
    /// Named pipelines referenced but not compiled yet
    needed: Vec<String>,
    /// Every id ever put on the worklist
    started: HashSet<String>,
}

impl<'o> Compiler<'o> {
    pub fn new(options: &'o Options) -> Self {
        Self {
            options,
            needed: Vec::new(),
            started: HashSet::new(),
        }
    }

    pub fn options(&self) -> &'o Options {
        self.options
    }

    /// Compile a definition into a pipeline
    pub fn compile(&mut self, definition: &Json) -> Result<Pipeline> {
        Ok(Pipeline::new(self.steps(definition)?))
    }

    /// Compile the definition under `key`, or an empty pipeline when absent
    pub fn compile_prop(&mut self, props: &Props, key: &str) -> Result<Pipeline> {
        match props.get(key) {
            Some(Json::Null) | None => Ok(Pipeline::default()),
            Some(definition) => self.compile(definition),
        }
    }

    /// Compile every named pipeline reached so far
    pub fn into_registry(mut self) -> Result<Registry> {
        let options = self.options;
        let mut registry = Registry::new();

        while let Some(id) = self.needed.pop() {
            let definition = options
                .pipelines
                .get(&id)
                .ok_or_else(|| Error::PipelineNotFound { id: id.clone() })?;
            let pipeline = self.compile(definition)?;
            debug!(id = %id, steps = pipeline.len(), "compiled named pipeline");
            registry.insert(id, pipeline);
        }

        Ok(registry)
    }

    fn steps(&mut self, definition: &Json) -> Result<Vec<Step>> {
        match definition {
            Json::String(text) => Ok(path::parse(text).into_iter().map(Step::from).collect()),
            Json::Array(items) => {
                let mut steps = Vec::new();
                for item in items {
                    steps.extend(self.steps(item)?);
                }
                Ok(steps)
            }
            Json::Object(props) => Ok(vec![Step::Operation(self.object(props)?)]),
            other => Err(Error::invalid_definition(
                "definition",
                format!(
                    "expected a path, a pipeline or an object, found {}",
                    json_kind(other)
                ),
            )),
        }
    }

    fn object(&mut self, props: &Props) -> Result<Operation> {
        let rewritten = self
            .options
            .shorthand
            .as_ref()
            .and_then(|hook| hook(props))
            .unwrap_or_else(|| props.clone());
        let props = shorthand::expand(rewritten)?;

        let kind = if let Some(name) = props.get("$transform") {
            self.transform(name, &props)?
        } else if let Some(id) = props.get("$apply") {
            self.apply(id)?
        } else if let Some(alternatives) = props.get("$alt") {
            OperationKind::Alt {
                pipelines: self.pipelines("$alt", alternatives)?,
            }
        } else if let Some(slots) = props.get("$array") {
            OperationKind::Array {
                pipelines: self.pipelines("$array", slots)?,
            }
        } else if let Some(condition) = props.get("$if") {
            if condition.is_null() {
                return Err(Error::invalid_definition("$if", "a condition is required"));
            }
            OperationKind::If {
                condition: self.compile(condition)?,
                then: self.compile_prop(&props, "then")?,
                otherwise: self.compile_prop(&props, "else")?,
            }
        } else {
            self.mutation(&props)?
        };

        self.with_flags(Operation::new(kind), &props)
    }

    fn with_flags(&self, mut op: Operation, props: &Props) -> Result<Operation> {
        op.flip = flag(props, "$flip");
        op.iterate = flag(props, "$iterate");
        op.direction = match props.get("$direction") {
            None | Some(Json::Null) => None,
            Some(Json::String(text)) => Some(self.options.parse_direction(text).ok_or_else(|| {
                Error::invalid_definition("$direction", format!("unknown direction '{}'", text))
            })?),
            Some(other) => {
                return Err(Error::invalid_definition(
                    "$direction",
                    format!("expected a string, found {}", json_kind(other)),
                ))
            }
        };
        Ok(op)
    }

    fn transform(&mut self, name: &Json, props: &Props) -> Result<OperationKind> {
        let Some(name) = name.as_str() else {
            return Err(Error::invalid_definition(
                "$transform",
                format!("expected a transformer name, found {}", json_kind(name)),
            ));
        };
        let transformer = self
            .options
            .transformers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TransformerNotFound {
                name: name.to_string(),
            })?;

        let mapper = transformer(props, self)?;
        Ok(OperationKind::Transform(TransformStep {
            name: name.to_string(),
            mapper,
        }))
    }

    fn apply(&mut self, id: &Json) -> Result<OperationKind> {
        let Some(id) = id.as_str() else {
            return Err(Error::invalid_definition(
                "$apply",
                format!("expected a pipeline id, found {}", json_kind(id)),
            ));
        };
        if !self.options.pipelines.contains_key(id) {
            return Err(Error::PipelineNotFound { id: id.to_string() });
        }
        if self.started.insert(id.to_string()) {
            self.needed.push(id.to_string());
        }
        Ok(OperationKind::Apply { id: id.to_string() })
    }

    fn pipelines(&mut self, operator: &str, definition: &Json) -> Result<Vec<Pipeline>> {
        match definition {
            Json::Array(items) if !items.is_empty() => {
                items.iter().map(|item| self.compile(item)).collect()
            }
            other => Err(Error::invalid_definition(
                operator,
                format!("expected a non-empty list of pipelines, found {}", json_kind(other)),
            )),
        }
    }

    fn mutation(&mut self, props: &Props) -> Result<OperationKind> {
        let mut pipelines = Vec::with_capacity(props.len());
        let mut modify = None;

        for (key, definition) in props {
            if key.starts_with('$') {
                if key == "$modify" {
                    modify = self.modify(definition)?;
                } else if !CONTROL_KEYS.contains(&key.as_str()) {
                    log::warn!("Dropping unrecognised key '{}' in mutation", key);
                }
                continue;
            }

            let mut steps = self.steps(definition)?;
            if key.ends_with("[]") && definition.is_object() {
                if let [step] = steps.as_mut_slice() {
                    if let Some(op) = step.as_operation_mut() {
                        op.iterate = true;
                    }
                }
            }
            steps.extend(path::parse_set(key).into_iter().map(Step::from));
            pipelines.push(Pipeline::new(steps));
        }
        pipelines.extend(modify);

        Ok(OperationKind::Mutation {
            pipelines,
            no_defaults: flag(props, "$noDefaults"),
        })
    }

    fn modify(&mut self, definition: &Json) -> Result<Option<Pipeline>> {
        let mut steps: Vec<Step> = match definition {
            Json::Bool(false) | Json::Null => return Ok(None),
            Json::Bool(true) => Vec::new(),
            Json::String(text) => path::parse(text).into_iter().map(Step::from).collect(),
            other => {
                return Err(Error::invalid_definition(
                    "$modify",
                    format!("expected a boolean or a path, found {}", json_kind(other)),
                ))
            }
        };
        steps.push(PathStep::get(PathKind::Modify).into());
        Ok(Some(Pipeline::new(steps)))
    }
}

fn flag(props: &Props, key: &str) -> bool {
    props.get(key).and_then(Json::as_bool).unwrap_or(false)
}
