//! Pipeline interpreter
//!
//! The core loop walks a compiled pipeline against a value. Path steps are
//! handled here; operation steps are handed to [`handlers`](super::handlers).
//!
//! The loop is written once as boxed async recursion. Nothing in it awaits
//! except sub-pipeline runs and transform functions, so when every transform
//! answers immediately the whole run completes in a single poll. The sync
//! driver relies on that.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use super::handlers;
use super::state::State;
use super::types::{Operation, PathKind, PathStep, Step};
use super::unwind::{set_position, unwind, MAX_SET_POSITION};
use crate::error::Result;
use crate::value::{Map, Value};
use futures::future::BoxFuture;
use tracing::trace;

/// Run a pipeline in the direction of `state`
///
/// The unwind levels of `state` are recomputed from its target, so the
/// caller should hand in a fresh frame.
pub fn run_pipeline<'a>(
    steps: &'a [Step],
    value: Value,
    state: &'a mut State,
) -> BoxFuture<'a, Result<Value>> {
    Box::pin(async move {
        let rev = state.rev;
        let ordered: Vec<&Step> = if rev {
            steps.iter().rev().collect()
        } else {
            steps.iter().collect()
        };
        state.levels = unwind(state.target.as_ref(), &ordered, rev);
        run_steps(&ordered, value, state).await
    })
}

/// Walk steps that are already ordered for the direction
fn run_steps<'a>(
    steps: &'a [&'a Step],
    mut value: Value,
    state: &'a mut State,
) -> BoxFuture<'a, Result<Value>> {
    Box::pin(async move {
        let rev = state.rev;
        let mut i = 0;

        while i < steps.len() {
            match steps[i] {
                Step::Path(path) => {
                    let set = path.is_set(rev);
                    let iterates = value.is_array()
                        && matches!(path.kind, PathKind::Prop { slashed, .. } if !(set && slashed));
                    if let Some(boundary) = iterates
                        .then(|| hand_off_boundary(steps, i, set, rev))
                        .flatten()
                    {
                        value = hand_off(&steps[i..boundary], value, state).await?;
                        i = boundary;
                        continue;
                    }
                    value = if set {
                        set_step(path, value, state)
                    } else {
                        get_step(path, value, state)
                    };
                }
                Step::Operation(op) => {
                    value = run_operation(op, value, state).await?;
                }
            }
            i += 1;
        }

        Ok(value)
    })
}

/// Find where per-item iteration ends for a prop step meeting a list
///
/// A get iterates up to the next array marker that sets in this direction,
/// or failing that the next set step, or the end of the pipeline. A set
/// only hands off when a set array marker follows through set steps alone.
fn hand_off_boundary(steps: &[&Step], start: usize, set: bool, rev: bool) -> Option<usize> {
    let rest = &steps[start + 1..];
    let is_set_marker =
        |step: &&Step| step.as_path().is_some_and(|p| p.is_set(rev) && p.is_array_marker());

    let offset = if set {
        let run = rest.iter().take_while(|step| step.is_set(rev)).count();
        rest[..run].iter().position(is_set_marker)?
    } else {
        rest.iter()
            .position(is_set_marker)
            .or_else(|| rest.iter().position(|step| step.is_set(rev)))
            .unwrap_or(rest.len())
    };
    Some(start + 1 + offset)
}

/// Run `slice` once per list item and collect the results
///
/// Each item gets a cloned context stack. When the slice sets into the
/// target, each item unwinds the matching item of the existing list, and the
/// results are kept as they are. Otherwise results are flattened one level.
async fn hand_off(slice: &[&Step], value: Value, state: &mut State) -> Result<Value> {
    let Value::Array(items) = value else {
        return Ok(value);
    };
    let rev = state.rev;
    let depth = slice
        .iter()
        .filter(|step| step.as_path().is_some_and(|p| p.is_set(rev) && p.descends()))
        .count();

    let base = state
        .levels
        .len()
        .checked_sub(depth + 1)
        .map(|i| state.levels[i].clone())
        .unwrap_or_default();
    let peek = state.target_peek();

    trace!(items = items.len(), steps = slice.len(), depth, "array hand-off");

    let mut results = Vec::with_capacity(items.len());
    for (k, item) in items.into_iter().enumerate() {
        let levels = if !state.has_levels() {
            Vec::new()
        } else if depth > 0 {
            let existing = base.get_index(k as i64);
            unwind(Some(&existing), slice, rev)
        } else if peek.is_array() {
            vec![peek.get_index(k as i64)]
        } else {
            Vec::new()
        };

        let mut frame = state.item_frame(k, levels);
        let result = run_steps(slice, item, &mut frame).await?;
        match result {
            Value::Array(inner) if depth == 0 => results.extend(inner),
            other => results.push(other),
        }
    }

    let keep = state.levels.len().saturating_sub(depth);
    state.levels.truncate(keep);
    Ok(Value::Array(results))
}

/// Check the direction restriction, then run the operation once or per item
pub(crate) fn run_operation<'a>(
    op: &'a Operation,
    value: Value,
    state: &'a mut State,
) -> BoxFuture<'a, Result<Value>> {
    Box::pin(async move {
        if !op.applies_to(state.rev) {
            return Ok(value);
        }
        trace!(operation = op.kind.name(), rev = state.rev, iterate = op.iterate, "dispatch");

        match value {
            Value::Array(items) if op.iterate => {
                let peek = state.target_peek();
                let mut results = Vec::with_capacity(items.len());
                for (k, item) in items.into_iter().enumerate() {
                    let levels = match &peek {
                        Value::Array(_) => vec![peek.get_index(k as i64)],
                        _ => Vec::new(),
                    };
                    let mut frame = state.item_frame(k, levels);
                    results.push(handlers::dispatch(op, item, &mut frame).await?);
                }
                Ok(Value::Array(results))
            }
            value => handlers::dispatch(op, value, state).await,
        }
    })
}

fn get_step(path: &PathStep, value: Value, state: &mut State) -> Value {
    match &path.kind {
        PathKind::Prop { key, .. } => {
            let next = value.get_prop(key);
            state.context.push(value);
            next
        }
        PathKind::Index(index) => {
            let next = value.get_index(*index);
            state.context.push(value);
            next
        }
        PathKind::Array => value.into_list(state.no_defaults),
        PathKind::Parent => state.context.pop().unwrap_or(value),
        PathKind::Root => {
            let mut context = std::mem::take(&mut state.context);
            if context.is_empty() {
                value
            } else {
                context.swap_remove(0)
            }
        }
        PathKind::Plug => Value::Undefined,
        PathKind::Modify => value,
    }
}

fn set_step(path: &PathStep, value: Value, state: &mut State) -> Value {
    match &path.kind {
        PathKind::Prop { key, slashed } => {
            state.levels.pop();
            let container = state.target_peek();
            if *slashed {
                return container;
            }
            if value.is_undefined() && state.no_defaults {
                return keep_container(container);
            }
            let mut map = match container {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            map.insert(key.clone(), value);
            Value::Object(map)
        }
        PathKind::Index(index) => {
            state.levels.pop();
            let container = state.target_peek();
            if value.is_undefined() && state.no_defaults {
                return keep_container(container);
            }
            let position = match &container {
                Value::Array(items) => set_position(*index, items.len()),
                _ => set_position(*index, 0),
            };
            if position > MAX_SET_POSITION {
                trace!(index, "set index out of range");
                return keep_container(container);
            }
            let mut items = match container {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            if items.len() <= position {
                items.resize(position + 1, Value::Undefined);
            }
            items[position] = value;
            Value::Array(items)
        }
        PathKind::Array => value.into_list(state.no_defaults),
        PathKind::Plug => state.target_peek(),
        PathKind::Parent | PathKind::Root | PathKind::Modify => value,
    }
}

fn keep_container(container: Value) -> Value {
    match container {
        Value::Object(_) | Value::Array(_) => container,
        _ => Value::Undefined,
    }
}
