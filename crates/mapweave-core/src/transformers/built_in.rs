//! Built-in transformers
//!
//! These back the operator shorthands (`$and`, `$not`, `$filter`, `$lookup`
//! and friends) and are registered in every [`Options`](crate::Options)
//! unless replaced by name.
//!
//! Condition paths are compiled with the same compiler as the rest of the
//! definition and always run forward from the current value, so `^` and
//! `^^` reach the enclosing data.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use super::{mapper, transformer, DataMapper, Deferred, Props, Transformer};
use crate::definition::{compile_path, json_kind, Compiler};
use crate::error::{Error, Result};
use crate::options::Dictionary;
use crate::pipeline::{run_pipeline, Pipeline, State};
use crate::value::{shallow_merge, Value};
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::Value as Json;
use std::cmp::Ordering;
use std::collections::HashMap;

/// The default transformer table
pub fn transformers() -> HashMap<String, Transformer> {
    let mut table: HashMap<String, Transformer> = HashMap::new();
    table.insert("value".to_string(), transformer(value));
    table.insert("fixed".to_string(), transformer(fixed));
    table.insert("not".to_string(), transformer(not));
    table.insert("logical".to_string(), transformer(logical));
    table.insert("compare".to_string(), transformer(compare));
    table.insert("merge".to_string(), transformer(merge));
    table.insert("concat".to_string(), transformer(|p, c| concat(p, c, false)));
    table.insert("concatRev".to_string(), transformer(|p, c| concat(p, c, true)));
    table.insert("filter".to_string(), transformer(filter));
    table.insert("lookup".to_string(), transformer(|p, c| lookup(p, c, false)));
    table.insert("lookdown".to_string(), transformer(|p, c| lookup(p, c, true)));
    table.insert("map".to_string(), transformer(map));
    table.insert("index".to_string(), transformer(index));
    table
}

/// Run a pipeline in a frame of its own
fn run_in(pipeline: &Pipeline, value: Value, mut frame: State) -> BoxFuture<'static, Result<Value>> {
    let pipeline = pipeline.clone();
    Box::pin(async move { run_pipeline(&pipeline, value, &mut frame).await })
}

/// Run a condition forward from the current value
fn run_forward(pipeline: &Pipeline, value: Value, state: &State) -> BoxFuture<'static, Result<Value>> {
    run_in(pipeline, value, state.forward_frame())
}

/// A child frame running in the given direction, flip parity kept in step
fn oriented(state: &State, rev: bool) -> State {
    let mut frame = state.child();
    if frame.rev != rev {
        frame.rev = rev;
        frame.flip = !frame.flip;
    }
    frame
}

fn literal(props: &Props, key: &str) -> Value {
    props.get(key).cloned().map(Value::from).unwrap_or_default()
}

/// Compile a list of pipelines under `key`
fn pipelines(
    props: &Props,
    key: &str,
    compiler: &mut Compiler<'_>,
    name: &str,
) -> Result<Vec<Pipeline>> {
    match props.get(key) {
        Some(Json::Array(items)) => items.iter().map(|item| compiler.compile(item)).collect(),
        Some(other) => Err(Error::invalid_definition(
            name,
            format!("`{}` must be a list of pipelines, found {}", key, json_kind(other)),
        )),
        None => Err(Error::invalid_definition(name, format!("`{}` is required", key))),
    }
}

/// Equality that treats `1` and `1.0` as the same number
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => a.as_f64() == b.as_f64(),
        _ => a == b,
    }
}

fn value(props: &Props, _compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let literal = literal(props, "value");
    Ok(mapper(move |_, state| {
        Deferred::ready(if state.rev {
            Value::Undefined
        } else {
            literal.clone()
        })
    }))
}

fn fixed(props: &Props, _compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let literal = literal(props, "value");
    Ok(mapper(move |_, _| Deferred::ready(literal.clone())))
}

fn not(props: &Props, compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let path = compiler.compile_prop(props, "path")?;
    Ok(mapper(move |value, state| {
        let check = run_forward(&path, value, state);
        Deferred::pending(async move { Ok(Value::Bool(!check.await?.is_truthy())) })
    }))
}

fn logical(props: &Props, compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let paths = pipelines(props, "path", compiler, "logical")?;
    let any = match props.get("operator").and_then(Json::as_str) {
        None | Some("AND") => false,
        Some("OR") => true,
        Some(other) => {
            return Err(Error::invalid_definition(
                "logical",
                format!("unknown operator '{}'", other),
            ))
        }
    };

    Ok(mapper(move |value, state| {
        let checks: Vec<_> = paths
            .iter()
            .map(|path| run_forward(path, value.clone(), state))
            .collect();
        Deferred::pending(async move {
            for check in checks {
                if check.await?.is_truthy() == any {
                    return Ok(Value::Bool(any));
                }
            }
            Ok(Value::Bool(!any))
        })
    }))
}

/// Comparison operators of the `compare` transformer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Exists,
    Matches,
}

impl Comparison {
    pub fn parse(operator: &str) -> Option<Self> {
        Some(match operator {
            "=" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::Less,
            "<=" => Self::LessOrEqual,
            ">" => Self::Greater,
            ">=" => Self::GreaterOrEqual,
            "exists" => Self::Exists,
            "matches" => Self::Matches,
            _ => return None,
        })
    }

    pub fn test(self, actual: &Value, expected: &Value, pattern: Option<&Regex>) -> bool {
        let order = || match (actual, expected) {
            (Value::Number(_), Value::Number(_)) => actual.as_f64()?.partial_cmp(&expected.as_f64()?),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        };
        match self {
            Self::Equal => values_equal(actual, expected),
            Self::NotEqual => !values_equal(actual, expected),
            Self::Less => order() == Some(Ordering::Less),
            Self::LessOrEqual => matches!(order(), Some(Ordering::Less | Ordering::Equal)),
            Self::Greater => order() == Some(Ordering::Greater),
            Self::GreaterOrEqual => matches!(order(), Some(Ordering::Greater | Ordering::Equal)),
            Self::Exists => !actual.is_undefined(),
            Self::Matches => match (actual.as_str(), pattern) {
                (Some(text), Some(pattern)) => pattern.is_match(text),
                _ => false,
            },
        }
    }
}

fn compare(props: &Props, compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let path = compiler.compile_prop(props, "path")?;
    let operator = props.get("operator").and_then(Json::as_str).unwrap_or("=");
    let comparison = Comparison::parse(operator).ok_or_else(|| {
        Error::invalid_definition("compare", format!("unknown operator '{}'", operator))
    })?;
    let expected = literal(props, "match");
    let match_path = match props.get("matchPath") {
        Some(definition) => Some(compiler.compile(definition)?),
        None => None,
    };
    let pattern = match (comparison, expected.as_str()) {
        (Comparison::Matches, Some(source)) => Some(Regex::new(source).map_err(|e| {
            Error::invalid_definition("compare", format!("invalid pattern '{}': {}", source, e))
        })?),
        (Comparison::Matches, None) => {
            return Err(Error::invalid_definition(
                "compare",
                "`matches` needs a string pattern in `match`",
            ))
        }
        _ => None,
    };

    Ok(mapper(move |value, state| {
        let subject = run_forward(&path, value.clone(), state);
        let against = match_path
            .as_ref()
            .map(|match_path| run_forward(match_path, value, state));
        let expected = expected.clone();
        let pattern = pattern.clone();
        Deferred::pending(async move {
            let actual = subject.await?;
            let expected = match against {
                Some(run) => run.await?,
                None => expected,
            };
            Ok(Value::Bool(comparison.test(&actual, &expected, pattern.as_ref())))
        })
    }))
}

/// Merge object results left to right; non-objects are ignored
fn merge_objects(results: Vec<Value>) -> Value {
    results
        .into_iter()
        .filter(Value::is_object)
        .fold(Value::Undefined, |merged, result| {
            if merged.is_undefined() {
                result
            } else {
                shallow_merge(merged, result)
            }
        })
}

async fn collect(runs: Vec<BoxFuture<'static, Result<Value>>>) -> Result<Vec<Value>> {
    let mut results = Vec::with_capacity(runs.len());
    for run in runs {
        results.push(run.await?);
    }
    Ok(results)
}

fn merge(props: &Props, compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let paths = pipelines(props, "path", compiler, "merge")?;
    Ok(mapper(move |value, state| {
        let runs = paths
            .iter()
            .map(|path| run_in(path, value.clone(), state.child()))
            .collect();
        Deferred::pending(async move { Ok(merge_objects(collect(runs).await?)) })
    }))
}

/// `concat` gathers going forward and splits going in reverse; `concatRev`
/// does the opposite
fn concat(props: &Props, compiler: &mut Compiler<'_>, swapped: bool) -> Result<DataMapper> {
    let name = if swapped { "concatRev" } else { "concat" };
    let paths = pipelines(props, "path", compiler, name)?;

    Ok(mapper(move |value, state| {
        if state.rev == swapped {
            let runs = paths
                .iter()
                .map(|path| run_in(path, value.clone(), oriented(state, false)))
                .collect();
            return Deferred::pending(async move {
                let mut items = Vec::new();
                for result in collect(runs).await? {
                    match result {
                        Value::Array(inner) => items.extend(inner),
                        Value::Undefined => {}
                        other => items.push(other),
                    }
                }
                Ok(Value::Array(items))
            });
        }

        let whole = value.into_list(false);
        let runs = paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let part = if i == 0 {
                    whole.clone()
                } else {
                    Value::Array(Vec::new())
                };
                run_in(path, part, oriented(state, true))
            })
            .collect();
        Deferred::pending(async move { Ok(merge_objects(collect(runs).await?)) })
    }))
}

fn filter(props: &Props, compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let condition = compiler.compile_prop(props, "path")?;

    Ok(mapper(move |value, state| match value {
        Value::Undefined => Deferred::ready(Value::Undefined),
        Value::Array(items) => {
            let checks: Vec<_> = items
                .iter()
                .enumerate()
                .map(|(k, item)| {
                    let mut frame = state.forward_frame();
                    frame.index = Some(k);
                    run_in(&condition, item.clone(), frame)
                })
                .collect();
            Deferred::pending(async move {
                let mut kept = Vec::new();
                for (item, check) in items.into_iter().zip(checks) {
                    if check.await?.is_truthy() {
                        kept.push(item);
                    }
                }
                Ok(Value::Array(kept))
            })
        }
        single => {
            let check = run_forward(&condition, single.clone(), state);
            Deferred::pending(async move {
                Ok(if check.await?.is_truthy() {
                    single
                } else {
                    Value::Undefined
                })
            })
        }
    }))
}

/// `lookup` finds items by a property going forward and extracts the
/// property going in reverse; `lookdown` does the opposite
fn lookup(props: &Props, compiler: &mut Compiler<'_>, swapped: bool) -> Result<DataMapper> {
    let name = if swapped { "lookdown" } else { "lookup" };
    let array_path = match props.get("arrayPath") {
        Some(path @ Json::String(_)) => compile_path(path)?,
        Some(other) => {
            return Err(Error::invalid_definition(
                name,
                format!("`arrayPath` must be a path string, found {}", json_kind(other)),
            ))
        }
        None => return Err(Error::invalid_definition(name, "`arrayPath` is required")),
    };
    let prop_path = compiler.compile_prop(props, "propPath")?;
    let several = props
        .get("matchSeveral")
        .and_then(Json::as_bool)
        .unwrap_or(false);

    Ok(mapper(move |value, state| {
        if state.rev == swapped {
            let array = run_forward(&array_path, value.clone(), state);
            let prop_path = prop_path.clone();
            let frame = state.forward_frame();
            Deferred::pending(async move {
                let candidates = match array.await? {
                    Value::Array(items) => items,
                    Value::Undefined => Vec::new(),
                    other => vec![other],
                };
                let mut keyed = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    let key = run_in(&prop_path, candidate.clone(), frame.child()).await?;
                    keyed.push((key, candidate));
                }
                Ok(find_matches(value, &keyed, several))
            })
        } else {
            let extract = |item: Value| run_forward(&prop_path, item, state);
            match value {
                Value::Array(items) => {
                    let runs = items.into_iter().map(extract).collect();
                    Deferred::pending(async move { Ok(Value::Array(collect(runs).await?)) })
                }
                Value::Undefined => Deferred::ready(Value::Undefined),
                single => Deferred::Pending(extract(single)),
            }
        }
    }))
}

fn find_matches(value: Value, keyed: &[(Value, Value)], several: bool) -> Value {
    let find = |wanted: &Value| -> Value {
        let mut found = keyed
            .iter()
            .filter(|(key, _)| values_equal(key, wanted))
            .map(|(_, item)| item.clone());
        if several {
            Value::Array(found.collect())
        } else {
            found.next().unwrap_or_default()
        }
    };

    match value {
        Value::Array(wanted) if several => Value::Array(
            wanted
                .iter()
                .flat_map(|w| match find(w) {
                    Value::Array(items) => items,
                    _ => Vec::new(),
                })
                .collect(),
        ),
        Value::Array(wanted) => Value::Array(wanted.iter().map(find).collect()),
        Value::Undefined => Value::Undefined,
        single => find(&single),
    }
}

fn dictionary(props: &Props, compiler: &Compiler<'_>) -> Result<Dictionary> {
    match props.get("dictionary") {
        Some(Json::String(name)) => compiler
            .options()
            .dictionaries
            .get(name)
            .cloned()
            .ok_or_else(|| Error::invalid_definition("map", format!("unknown dictionary '{}'", name))),
        Some(Json::Array(pairs)) => pairs
            .iter()
            .map(|pair| match pair {
                Json::Array(sides) if sides.len() == 2 => {
                    Ok((Value::from(sides[0].clone()), Value::from(sides[1].clone())))
                }
                other => Err(Error::invalid_definition(
                    "map",
                    format!("dictionary entries must be [from, to] pairs, found {}", other),
                )),
            })
            .collect(),
        _ => Err(Error::invalid_definition(
            "map",
            "`dictionary` must name a dictionary or list its pairs",
        )),
    }
}

/// Translate one value through a dictionary; `*` on the source side matches anything
pub fn translate(dictionary: &Dictionary, value: &Value, rev: bool) -> Value {
    let sides = |(left, right): &(Value, Value)| {
        if rev {
            (right.clone(), left.clone())
        } else {
            (left.clone(), right.clone())
        }
    };
    let wildcard = Value::from("*");

    dictionary
        .iter()
        .map(sides)
        .find(|(from, _)| values_equal(from, value))
        .or_else(|| dictionary.iter().map(sides).find(|(from, _)| *from == wildcard))
        .map(|(_, to)| to)
        .unwrap_or_default()
}

fn map(props: &Props, compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    let dictionary = dictionary(props, compiler)?;
    Ok(mapper(move |value, state| {
        let rev = state.rev;
        Deferred::ready(match value {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| translate(&dictionary, item, rev))
                    .collect(),
            ),
            single => translate(&dictionary, &single, rev),
        })
    }))
}

fn index(_props: &Props, _compiler: &mut Compiler<'_>) -> Result<DataMapper> {
    Ok(mapper(|_, state| {
        Deferred::ready(state.index.map(Value::from).unwrap_or_default())
    }))
}
