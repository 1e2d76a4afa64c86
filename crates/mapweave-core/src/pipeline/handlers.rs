//! Operation handlers
//!
//! One handler per operation kind. Each derives child frames from the
//! calling frame and runs its sub-pipelines through the interpreter, so a
//! handler never leaks context pushes or direction changes to its siblings.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use super::interpreter::run_pipeline;
use super::state::State;
use super::types::{Operation, OperationKind, Pipeline, Step, TransformStep};
use crate::error::{Error, Result};
use crate::value::{shallow_merge, Map, Value};

pub(crate) async fn dispatch(op: &Operation, value: Value, state: &mut State) -> Result<Value> {
    match &op.kind {
        OperationKind::Mutation {
            pipelines,
            no_defaults,
        } => mutation(op, pipelines, *no_defaults, value, state).await,
        OperationKind::Transform(step) => transform(op, step, value, state).await,
        OperationKind::Apply { id } => apply(op, id, value, state).await,
        OperationKind::Alt { pipelines } => alt(op, pipelines, value, state).await,
        OperationKind::Array { pipelines } => array(op, pipelines, value, state).await,
        OperationKind::If {
            condition,
            then,
            otherwise,
        } => branch(op, condition, then, otherwise, value, state).await,
    }
}

/// The existing value at the current depth, as a target for a sub-run
fn current_target(state: &State) -> Option<Value> {
    state.has_levels().then(|| state.target_peek())
}

/// The target as an object to accumulate into
fn accumulator(state: &State) -> Value {
    match state.target_peek() {
        object @ Value::Object(_) => object,
        _ => Value::Object(Map::new()),
    }
}

/// Fold a sub-pipeline result into the accumulator
///
/// A pipeline that sets into its target already returns the whole updated
/// accumulator. Anything else contributes its members only when it produced
/// an object, or a list of objects gathered member by member, and never
/// overrides members already written.
fn accumulate(acc: Value, result: Value, pipeline: &Pipeline, rev: bool) -> Value {
    if pipeline.sets_in(rev) {
        return result;
    }
    match result {
        Value::Object(_) => shallow_merge(result, acc),
        Value::Array(items) => match gather_members(items) {
            Some(gathered) => shallow_merge(gathered, acc),
            None => acc,
        },
        _ => acc,
    }
}

/// Turn a list of objects into one object of lists, keeping positions
///
/// Undefined items and members missing from an item hold their position
/// as undefined. `None` when any item is not an object.
fn gather_members(items: Vec<Value>) -> Option<Value> {
    let mut gathered: Map = Map::new();
    let count = items.len();
    for (position, item) in items.into_iter().enumerate() {
        let members = match item {
            Value::Object(members) => members,
            Value::Undefined => continue,
            _ => return None,
        };
        for (key, value) in members {
            let column = gathered
                .entry(key)
                .or_insert_with(|| Value::Array(vec![Value::Undefined; count]));
            if let Value::Array(column) = column {
                column[position] = value;
            }
        }
    }
    (!gathered.is_empty()).then_some(Value::Object(gathered))
}

fn allows(pipeline: &Pipeline, rev: bool) -> bool {
    pipeline.direction().map_or(true, |d| d.is_rev() == rev)
}

async fn mutation(
    op: &Operation,
    pipelines: &[Pipeline],
    no_defaults: bool,
    value: Value,
    state: &mut State,
) -> Result<Value> {
    if value.is_undefined() {
        return Ok(state.target_peek());
    }

    let mut acc = accumulator(state);
    let last = pipelines.len().saturating_sub(1);

    for (position, pipeline) in pipelines.iter().enumerate() {
        let mut frame = state.operation_frame(op.flip);
        frame.no_defaults |= no_defaults;
        let rev = frame.rev;

        if let Some(path) = pipeline.modify_path() {
            if position != last {
                return Err(Error::InvalidPipeline {
                    message: "modify marker must close the last sub-pipeline of a mutation"
                        .to_string(),
                });
            }
            acc = modify(path, value.clone(), acc, frame).await?;
            continue;
        }

        frame.target = Some(acc.clone());
        let result = run_pipeline(pipeline, value.clone(), &mut frame).await?;
        acc = accumulate(acc, result, pipeline, rev);
    }

    Ok(acc)
}

/// Shallow-merge copied-through members; explicit members win
async fn modify(path: &[Step], value: Value, acc: Value, mut frame: State) -> Result<Value> {
    if !frame.rev {
        let copied = run_pipeline(path, value, &mut frame).await?;
        return Ok(shallow_merge(copied, acc));
    }

    let mut lookup = frame.forward_frame();
    let existing = run_pipeline(path, acc.clone(), &mut lookup).await?;
    let merged = shallow_merge(value, existing);
    frame.target = Some(acc);
    run_pipeline(path, merged, &mut frame).await
}

async fn transform(
    op: &Operation,
    step: &TransformStep,
    value: Value,
    state: &mut State,
) -> Result<Value> {
    let mut flipped;
    let frame = if op.flip {
        flipped = state.operation_frame(true);
        flipped.levels = state.levels.clone();
        &flipped
    } else {
        &*state
    };

    (step.mapper)(value, frame).resolve().await
}

async fn apply(op: &Operation, id: &str, value: Value, state: &mut State) -> Result<Value> {
    let pipeline = state.pipeline(id)?;
    let mut frame = state.operation_frame(op.flip);
    frame.target = current_target(state);
    run_pipeline(&pipeline, value, &mut frame).await
}

/// First alternative with a result outside the nonvalues wins
///
/// In reverse the last alternative is a fallback: it receives the value
/// whenever no earlier alternative sets into the target, even when its own
/// direction restriction would exclude it.
async fn alt(op: &Operation, pipelines: &[Pipeline], value: Value, state: &mut State) -> Result<Value> {
    let Some((fallback, earlier)) = pipelines.split_last() else {
        return Ok(Value::Undefined);
    };
    let rev = state.rev != op.flip;
    let target = current_target(state);
    let candidates = if rev { earlier } else { pipelines };

    let mut last = Value::Undefined;
    let mut always_set = false;
    for pipeline in candidates {
        if !allows(pipeline, rev) {
            continue;
        }
        always_set |= pipeline.sets_in(rev);

        let mut frame = state.operation_frame(op.flip);
        frame.target = target.clone();
        let result = run_pipeline(pipeline, value.clone(), &mut frame).await?;
        if !state.is_nonvalue(&result) {
            return Ok(result);
        }
        last = result;
    }

    if !rev || (always_set && !allows(fallback, rev)) {
        return Ok(last);
    }

    let mut frame = state.operation_frame(op.flip);
    frame.target = target;
    run_pipeline(fallback, value, &mut frame).await
}

async fn array(op: &Operation, pipelines: &[Pipeline], value: Value, state: &mut State) -> Result<Value> {
    let rev = state.rev != op.flip;

    if !rev {
        let mut items = Vec::with_capacity(pipelines.len());
        for pipeline in pipelines {
            let mut frame = state.operation_frame(op.flip);
            items.push(run_pipeline(pipeline, value.clone(), &mut frame).await?);
        }
        return Ok(Value::Array(items));
    }

    let items = match value {
        Value::Array(items) => items,
        Value::Undefined => Vec::new(),
        other => vec![other],
    };
    let mut acc = accumulator(state);
    for (k, pipeline) in pipelines.iter().enumerate() {
        let item = items.get(k).cloned().unwrap_or_default();
        let mut frame = state.operation_frame(op.flip);
        frame.target = Some(acc.clone());
        let result = run_pipeline(pipeline, item, &mut frame).await?;
        acc = accumulate(acc, result, pipeline, rev);
    }
    Ok(acc)
}

async fn branch(
    op: &Operation,
    condition: &Pipeline,
    then: &Pipeline,
    otherwise: &Pipeline,
    value: Value,
    state: &mut State,
) -> Result<Value> {
    let mut check = state.forward_frame();
    let matched = run_pipeline(condition, value.clone(), &mut check)
        .await?
        .is_truthy();

    let mut frame = state.operation_frame(op.flip);
    frame.target = current_target(state);
    let chosen = if matched { then } else { otherwise };
    run_pipeline(chosen, value, &mut frame).await
}
