//! Definition language: path grammar, shorthands and the compiler
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

pub mod compiler;
pub mod path;
pub mod shorthand;

pub use compiler::Compiler;

use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, Step};
use serde_json::Value as Json;

/// Compile a definition that may only be a path
///
/// Accepts a path string or a list of already split segment strings.
pub fn compile_path(definition: &Json) -> Result<Pipeline> {
    let steps = match definition {
        Json::String(text) => path::parse(text),
        Json::Array(items) => {
            let segments = items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| Error::InvalidPath {
                        message: "path segments must be strings".to_string(),
                        found: json_kind(item).to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            path::parse_segments(&segments)
        }
        other => {
            return Err(Error::InvalidPath {
                message: "expected a path string or a list of segments".to_string(),
                found: json_kind(other).to_string(),
            })
        }
    };
    Ok(Pipeline::new(steps.into_iter().map(Step::from).collect()))
}

/// Short name of a JSON value's type, for diagnostics
pub(crate) fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_path_accepts_strings_and_segments() {
        assert_eq!(compile_path(&json!("a.b[0]")).unwrap().len(), 3);
        assert_eq!(compile_path(&json!(["a.b", "c"])).unwrap().len(), 2);
    }

    #[test]
    fn test_compile_path_rejects_other_definitions() {
        let err = compile_path(&json!({ "title": "headline" })).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { ref found, .. } if found == "object"));

        let err = compile_path(&json!(["a", 1])).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { ref found, .. } if found == "number"));
    }
}
