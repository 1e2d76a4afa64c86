//! Sync and async drivers over the one interpreter
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use super::interpreter::run_pipeline;
use super::state::State;
use super::types::Step;
use crate::error::{Error, Result};
use crate::value::Value;
use futures::task::noop_waker;
use std::future::Future;
use std::task::{Context, Poll};

/// Run a pipeline to completion without an executor
///
/// The interpreter future is polled exactly once. It only stays pending when
/// a transform function handed back a deferred value that was not ready yet,
/// which is an error in a synchronous run.
pub fn run_sync(steps: &[Step], value: Value, state: &mut State) -> Result<Value> {
    let waker = noop_waker();
    let mut cx = Context::from_waker(&waker);
    let mut run = run_pipeline(steps, value, state);

    match run.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => Err(Error::DeferredInSync {
            operation: "transform function".to_string(),
        }),
    }
}

/// Run a pipeline, awaiting deferred values in the order they are reached
pub async fn run_async(steps: &[Step], value: Value, state: &mut State) -> Result<Value> {
    run_pipeline(steps, value, state).await
}
