//! Tree-shaped values flowing through mapping pipelines
//!
//! JSON has no way to say "there is nothing here", but the engine needs one:
//! a missing property is different from a property set to `null`. [`Value`]
//! is therefore a JSON value extended with [`Value::Undefined`].
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::fmt;

/// Insertion-ordered object members
pub type Map = IndexMap<String, Value>;

/// A value in a mapping pipeline
///
/// # Examples
///
/// ```
/// use mapweave_core::Value;
/// use serde_json::json;
///
/// let value = Value::from(json!({ "items": ["x", "y", "z"] }));
/// assert_eq!(value.get_prop("items").get_index(-1), Value::from("z"));
/// assert!(value.get_prop("missing").is_undefined());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The absent marker: no value at all
    #[default]
    Undefined,

    /// JSON null
    Null,

    /// JSON boolean
    Bool(bool),

    /// JSON number
    Number(Number),

    /// UTF-8 string
    String(String),

    /// Ordered list of values
    Array(Vec<Value>),

    /// Object with insertion-ordered members
    Object(Map),
}

impl Value {
    /// Check for the absent marker
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Read an object member, `Undefined` when missing or not an object
    pub fn get_prop(&self, key: &str) -> Value {
        match self {
            Value::Object(map) => map.get(key).cloned().unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Read a list item; negative indices count from the end
    pub fn get_index(&self, index: i64) -> Value {
        let Value::Array(items) = self else {
            return Value::Undefined;
        };
        let len = items.len() as i64;
        let position = if index < 0 { len + index } else { index };
        if position < 0 || position >= len {
            return Value::Undefined;
        }
        items[position as usize].clone()
    }

    /// Truthiness used by conditions
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Short name of the value's type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Wrap a non-list in a one-item list
    ///
    /// `Undefined` becomes an empty list unless `keep_undefined` is set.
    pub fn into_list(self, keep_undefined: bool) -> Value {
        match self {
            Value::Array(_) => self,
            Value::Undefined if keep_undefined => Value::Undefined,
            Value::Undefined => Value::Array(Vec::new()),
            other => Value::Array(vec![other]),
        }
    }

    /// Convert to JSON, dropping undefined members
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Shallow merge where members of `over` win unless they are undefined
///
/// A non-object `over` replaces `base` entirely, again unless it is
/// undefined.
pub fn shallow_merge(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut merged), Value::Object(over)) => {
            for (key, value) in over {
                if !value.is_undefined() {
                    merged.insert(key, value);
                } else if !merged.contains_key(&key) {
                    merged.insert(key, value);
                }
            }
            Value::Object(merged)
        }
        (base, Value::Undefined) => base,
        (_, over) => over,
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number((n as u64).into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut out = serializer.serialize_map(None)?;
                for (key, value) in map.iter().filter(|(_, v)| !v.is_undefined()) {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_data_is_undefined() {
        let value = Value::from(json!({ "a": { "b": 1 }, "list": [1, 2, 3] }));

        assert!(value.get_prop("x").is_undefined());
        assert!(value.get_prop("a").get_prop("b").get_prop("c").is_undefined());
        assert!(value.get_prop("a").get_index(0).is_undefined());
        assert!(value.get_prop("list").get_index(3).is_undefined());
        assert!(value.get_prop("list").get_index(-4).is_undefined());
        assert_eq!(value.get_prop("list").get_index(-1), Value::from(3i64));
    }

    #[test]
    fn test_to_json_drops_undefined_members() {
        let mut map = Map::new();
        map.insert("kept".to_string(), Value::from("x"));
        map.insert("gone".to_string(), Value::Undefined);
        let value = Value::Array(vec![Value::Object(map), Value::Undefined]);

        assert_eq!(value.to_json(), json!([{ "kept": "x" }, null]));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!([{ "kept": "x" }, null]));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::from(json!(0)).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from(json!([])).is_truthy());
        assert!(Value::from(json!(-1.5)).is_truthy());
    }

    #[test]
    fn test_into_list() {
        assert_eq!(Value::from("a").into_list(false), Value::from(json!(["a"])));
        assert_eq!(Value::Undefined.into_list(false), Value::from(json!([])));
        assert!(Value::Undefined.into_list(true).is_undefined());
    }

    #[test]
    fn test_shallow_merge_prefers_defined_over_values() {
        let base = Value::from(json!({ "a": 1, "b": 2, "nested": { "x": 1 } }));
        let mut over = Map::new();
        over.insert("b".to_string(), Value::from(3i64));
        over.insert("a".to_string(), Value::Undefined);
        over.insert("nested".to_string(), Value::from(json!({ "y": 2 })));

        let merged = shallow_merge(base, Value::Object(over));
        assert_eq!(merged.to_json(), json!({ "a": 1, "b": 3, "nested": { "y": 2 } }));
    }
}
