//! Transform functions plugged into pipelines
//!
//! A transformer is resolved by name when a `$transform` operation is
//! compiled. It receives the operation's props and the compiler, so it can
//! compile nested definitions up front, and returns a [`DataMapper`] that the
//! interpreter calls with each value it reaches.
//!
//! A data mapper answers with a [`Deferred`]: either a result that is ready
//! now, or a future. The sync driver only accepts futures that complete
//! without waiting.
//!
//! # Examples
//!
//! ```
//! use mapweave_core::transformers::{mapper, transformer, Deferred};
//! use mapweave_core::{MapTransform, Options, Value};
//! use serde_json::json;
//!
//! let upper = transformer(|_props, _compiler| {
//!     Ok(mapper(|value, _state| {
//!         Deferred::ready(match value {
//!             Value::String(s) => Value::String(s.to_uppercase()),
//!             other => other,
//!         })
//!     }))
//! });
//!
//! let options = Options::default().with_transformer("upper", upper);
//! let def = json!({ "name": ["title", { "$transform": "upper" }] });
//! let mapping = MapTransform::new(&def, options).unwrap();
//!
//! let result = mapping.forward(Value::from(json!({ "title": "hello" }))).unwrap();
//! assert_eq!(result.to_json(), json!({ "name": "HELLO" }));
//! ```
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

pub mod built_in;

use crate::definition::Compiler;
use crate::error::Result;
use crate::pipeline::State;
use crate::value::Value;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Configuration of a `$transform` operation
pub type Props = serde_json::Map<String, serde_json::Value>;

/// A result that may not be available yet
pub enum Deferred {
    Ready(Result<Value>),
    Pending(BoxFuture<'static, Result<Value>>),
}

impl Deferred {
    pub fn ready(value: Value) -> Self {
        Deferred::Ready(Ok(value))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Deferred::Pending(Box::pin(future))
    }

    /// Wait for the result
    pub async fn resolve(self) -> Result<Value> {
        match self {
            Deferred::Ready(result) => result,
            Deferred::Pending(future) => future.await,
        }
    }
}

impl From<Result<Value>> for Deferred {
    fn from(result: Result<Value>) -> Self {
        Deferred::Ready(result)
    }
}

/// A transform function bound to its props
pub type DataMapper = Arc<dyn Fn(Value, &State) -> Deferred + Send + Sync>;

/// A named transform function factory
pub type Transformer = Arc<dyn Fn(&Props, &mut Compiler<'_>) -> Result<DataMapper> + Send + Sync>;

/// Wrap a closure as a [`DataMapper`]
pub fn mapper<F>(f: F) -> DataMapper
where
    F: Fn(Value, &State) -> Deferred + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`Transformer`]
pub fn transformer<F>(f: F) -> Transformer
where
    F: Fn(&Props, &mut Compiler<'_>) -> Result<DataMapper> + Send + Sync + 'static,
{
    Arc::new(f)
}
