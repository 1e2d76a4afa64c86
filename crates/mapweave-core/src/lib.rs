//! Mapweave Core - declarative, bidirectional data mapping
//!
//! A mapping is described once with a small JSON definition language and
//! compiled into a flat pipeline. The same pipeline runs forward (source to
//! target) and in reverse (target to source): every get implies its dual set.
//!
//! # Main Components
//!
//! - **Value model**: JSON values plus an explicit "undefined" marker
//! - **Definition compiler**: paths, mutation objects and operators into pipelines
//! - **Interpreter**: one async core loop with sync and async drivers
//! - **Transformers**: pluggable functions behind `$transform` and the shorthands
//!
//! # Example
//!
//! ```
//! use mapweave_core::{MapTransform, Options, Result, Value};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let def = json!(["data.items[]", {
//!         "$iterate": true,
//!         "id": "key",
//!         "name": { "$alt": ["title", "label"] }
//!     }]);
//!     let mapping = MapTransform::new(&def, Options::default())?;
//!
//!     let source = json!({ "data": { "items": [{ "key": 1, "label": "one" }] } });
//!     let result = mapping.forward(Value::from(source))?;
//!     assert_eq!(result.to_json(), json!([{ "id": 1, "name": "one" }]));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod definition;
pub mod error;
pub mod mapper;
pub mod options;
pub mod pipeline;
pub mod transformers;
pub mod value;

// Re-export main types for convenience
pub use definition::{compile_path, Compiler};
pub use error::{Error, Result};
pub use mapper::MapTransform;
pub use options::{Dictionary, Options, RunOptions, ShorthandHook};
pub use pipeline::{Direction, Pipeline, Registry, State};
pub use transformers::{DataMapper, Deferred, Props, Transformer};
pub use value::{shallow_merge, Map, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
