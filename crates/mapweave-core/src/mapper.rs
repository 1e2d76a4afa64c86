//! Public entry point wiring the compiler to the interpreter
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use crate::definition::Compiler;
use crate::error::Result;
use crate::options::{Options, RunOptions};
use crate::pipeline::{run_async, run_sync, Pipeline, Registry, Shared, State};
use crate::value::Value;
use std::sync::Arc;
use tracing::debug;

/// A compiled, reusable mapping
///
/// Compilation happens once in [`MapTransform::new`]; the result is
/// immutable and can be shared between threads and concurrent runs.
///
/// # Examples
///
/// ```
/// use mapweave_core::{MapTransform, Options, Value};
/// use serde_json::json;
///
/// let def = json!({ "title": "headline", "tags": "meta.keywords[]" });
/// let mapping = MapTransform::new(&def, Options::default()).unwrap();
///
/// let source = Value::from(json!({ "headline": "Hi", "meta": { "keywords": "news" } }));
/// let target = mapping.forward(source).unwrap();
/// assert_eq!(target.to_json(), json!({ "title": "Hi", "tags": ["news"] }));
///
/// let back = mapping.reverse(target).unwrap();
/// assert_eq!(back.to_json(), json!({ "headline": "Hi", "meta": { "keywords": ["news"] } }));
/// ```
#[derive(Debug, Clone)]
pub struct MapTransform {
    pipeline: Pipeline,
    shared: Arc<Shared>,
    no_defaults: bool,
}

impl MapTransform {
    /// Compile a definition and the named pipelines it reaches
    pub fn new(definition: &serde_json::Value, options: Options) -> Result<Self> {
        let mut compiler = Compiler::new(&options);
        let pipeline = compiler.compile(definition)?;
        let pipelines = compiler.into_registry()?;

        debug!(
            steps = pipeline.len(),
            named = pipelines.len(),
            "compiled mapping definition"
        );

        Ok(Self {
            pipeline,
            shared: Arc::new(Shared::new(pipelines, options.nonvalues)),
            no_defaults: options.no_defaults,
        })
    }

    /// The compiled top-level pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Named pipelines compiled because the definition reaches them
    pub fn pipelines(&self) -> &Registry {
        &self.shared.pipelines
    }

    fn state(&self, options: RunOptions) -> State {
        State::new(Arc::clone(&self.shared), options.direction.is_rev())
            .with_target(options.target)
            .with_no_defaults(self.no_defaults)
    }

    pub fn forward(&self, value: Value) -> Result<Value> {
        self.run(value, RunOptions::forward())
    }

    pub fn reverse(&self, value: Value) -> Result<Value> {
        self.run(value, RunOptions::reverse())
    }

    /// Run synchronously; fails if a transform function defers its result
    pub fn run(&self, value: Value, options: RunOptions) -> Result<Value> {
        debug!(direction = %options.direction, "running mapping");
        let mut state = self.state(options);
        run_sync(&self.pipeline, value, &mut state)
    }

    pub async fn forward_async(&self, value: Value) -> Result<Value> {
        self.run_async(value, RunOptions::forward()).await
    }

    pub async fn reverse_async(&self, value: Value) -> Result<Value> {
        self.run_async(value, RunOptions::reverse()).await
    }

    /// Run, awaiting any deferred results of transform functions
    pub async fn run_async(&self, value: Value, options: RunOptions) -> Result<Value> {
        debug!(direction = %options.direction, "running mapping");
        let mut state = self.state(options);
        run_async(&self.pipeline, value, &mut state).await
    }

    /// Map a JSON document synchronously
    pub fn map_json(
        &self,
        value: &serde_json::Value,
        options: RunOptions,
    ) -> Result<serde_json::Value> {
        Ok(self.run(Value::from(value.clone()), options)?.to_json())
    }

    /// Map a JSON document, awaiting deferred results
    pub async fn map_json_async(
        &self,
        value: &serde_json::Value,
        options: RunOptions,
    ) -> Result<serde_json::Value> {
        Ok(self
            .run_async(Value::from(value.clone()), options)
            .await?
            .to_json())
    }
}
