//! Compiled pipelines and the interpreter that runs them
//!
//! # Module Organization
//!
//! - [`types`] - Steps, operations and the [`Pipeline`] sequence
//! - [`state`] - Run state threaded through the interpreter
//! - [`unwind`] - Target unwinder for merging into existing structure
//! - [`interpreter`] - The core loop and array hand-off
//! - [`driver`] - Sync and async entry points over the core loop
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

pub mod driver;
mod handlers;
pub mod interpreter;
pub mod state;
pub mod types;
pub mod unwind;


use indexmap::IndexMap;

pub use driver::{run_async, run_sync};
pub use interpreter::run_pipeline;
pub use state::{Shared, State};
pub use types::{
    Direction, Operation, OperationKind, PathKind, PathStep, Pipeline, Step, TransformStep,
};

/// Named pipelines, in the order they were compiled
pub type Registry = IndexMap<String, Pipeline>;
