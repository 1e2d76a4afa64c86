//! Target unwinder
//!
//! Before a pipeline runs against a merge target, the sub-values of the
//! target that each set step will write into are looked up ahead of time.
//! The interpreter pops one level per set step, innermost first, so writes
//! land inside the existing structure instead of replacing it.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use super::types::{PathKind, Step};
use crate::value::Value;

/// Furthest a set index step may grow a list
///
/// Writes past this position leave the container as it was, the way an
/// out-of-range read yields undefined.
pub const MAX_SET_POSITION: usize = 1 << 20;

/// Position a set index step writes to in a list of `len` items
///
/// Negative indices count from the end but never go below the first item,
/// so `[-1]` on an empty list writes position 0.
pub fn set_position(index: i64, len: usize) -> usize {
    if index < 0 {
        (len as i64 + index).max(0) as usize
    } else {
        index as usize
    }
}

/// Read the existing value a set step would overwrite
fn descend(level: &Value, kind: &PathKind) -> Value {
    match kind {
        PathKind::Prop { key, .. } => level.get_prop(key),
        PathKind::Index(index) => match level {
            Value::Array(items) => items
                .get(set_position(*index, items.len()))
                .cloned()
                .unwrap_or_default(),
            _ => Value::Undefined,
        },
        _ => Value::Undefined,
    }
}

/// Compute the unwind stack for `steps` already ordered for the direction
///
/// The stack starts with the target itself, followed by one entry per
/// descending set step from the outermost (executed last) inwards. Once a
/// level is missing or not indexable, every deeper entry is undefined. An
/// array marker among the set steps also ends the descent, as items below
/// it are unwound per item during array hand-off.
pub fn unwind(target: Option<&Value>, steps: &[&Step], rev: bool) -> Vec<Value> {
    let Some(target) = target else {
        return Vec::new();
    };

    let mut levels = vec![target.clone()];
    let mut current = Some(target.clone());

    for step in steps.iter().rev() {
        let Some(path) = step.as_path() else {
            continue;
        };
        if !path.is_set(rev) {
            continue;
        }
        if path.is_array_marker() {
            current = None;
            continue;
        }
        if !path.descends() {
            continue;
        }

        let next = match &current {
            Some(level @ (Value::Object(_) | Value::Array(_))) => descend(level, &path.kind),
            _ => Value::Undefined,
        };
        current = match next {
            Value::Object(_) | Value::Array(_) => Some(next.clone()),
            _ => None,
        };
        levels.push(next);
    }

    levels
}
