//! Built-in operator shorthands
//!
//! Shorthand keys are expanded to the canonical `$transform` form before an
//! operator object is compiled. Flags such as `$direction` and `$iterate`
//! are carried over untouched.
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use crate::transformers::Props;
use serde_json::Value as Json;

/// Expand the first shorthand found in `props`
pub fn expand(mut props: Props) -> Result<Props> {
    if props.contains_key("$transform") {
        return Ok(props);
    }

    if let Some(path) = props.remove("$and") {
        return Ok(canonical(props, "logical", [("path", path), ("operator", "AND".into())]));
    }
    if let Some(path) = props.remove("$or") {
        return Ok(canonical(props, "logical", [("path", path), ("operator", "OR".into())]));
    }
    if let Some(path) = props.remove("$not") {
        return Ok(canonical(props, "not", [("path", path)]));
    }
    if let Some(path) = props.remove("$merge") {
        return Ok(canonical(props, "merge", [("path", path)]));
    }
    if let Some(path) = props.remove("$concat") {
        return Ok(canonical(props, "concat", [("path", path)]));
    }
    if let Some(path) = props.remove("$concatRev") {
        return Ok(canonical(props, "concatRev", [("path", path)]));
    }
    if let Some(condition) = props.remove("$filter") {
        if condition.is_null() {
            return Err(Error::invalid_definition("$filter", "a condition is required"));
        }
        return Ok(canonical(props, "filter", [("path", condition)]));
    }
    for operator in ["$lookup", "$lookdown"] {
        if let Some(array_path) = props.remove(operator) {
            let prop_path = props.remove("path").ok_or_else(|| {
                Error::invalid_definition(operator, "a `path` to the matched property is required")
            })?;
            let name = &operator[1..];
            return Ok(canonical(
                props,
                name,
                [("arrayPath", array_path), ("propPath", prop_path)],
            ));
        }
    }
    if let Some(value) = props.remove("$value") {
        return Ok(canonical(props, "value", [("value", value)]));
    }
    if let Some(value) = props.remove("$fixed") {
        return Ok(canonical(props, "fixed", [("value", value)]));
    }

    Ok(props)
}

fn canonical<const N: usize>(mut rest: Props, name: &str, fields: [(&str, Json); N]) -> Props {
    rest.insert("$transform".to_string(), Json::String(name.to_string()));
    for (key, value) in fields {
        rest.insert(key.to_string(), value);
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(value: Json) -> Props {
        match value {
            Json::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_and_becomes_logical() {
        let expanded = expand(props(json!({ "$and": ["a", "b"], "$direction": "fwd" }))).unwrap();
        assert_eq!(
            Json::Object(expanded),
            json!({
                "$transform": "logical",
                "path": ["a", "b"],
                "operator": "AND",
                "$direction": "fwd"
            })
        );
    }

    #[test]
    fn test_lookup_requires_path() {
        let err = expand(props(json!({ "$lookup": "^^.users" }))).unwrap_err();
        assert!(err.to_string().contains("$lookup"));

        let expanded = expand(props(json!({ "$lookdown": "^^.users", "path": "id" }))).unwrap();
        assert_eq!(expanded["$transform"], json!("lookdown"));
        assert_eq!(expanded["propPath"], json!("id"));
    }

    #[test]
    fn test_filter_requires_condition() {
        assert!(expand(props(json!({ "$filter": null }))).is_err());
    }

    #[test]
    fn test_canonical_forms_untouched() {
        let original = props(json!({ "$transform": "compare", "$value": 1 }));
        assert_eq!(expand(original.clone()).unwrap(), original);
        let apply = props(json!({ "$apply": "entry" }));
        assert_eq!(expand(apply.clone()).unwrap(), apply);
    }
}
