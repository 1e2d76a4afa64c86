//! Compile and run options
//!
//! Copyright (c) 2025 Mapweave Team
//! Licensed under the Apache-2.0 license

use crate::pipeline::Direction;
use crate::transformers::{built_in, Props, Transformer};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Pairs of `(left, right)` values for the `map` transformer
pub type Dictionary = Vec<(Value, Value)>;

/// Rewrites an operator object before the built-in shorthands are expanded
///
/// Returning `None` leaves the object unchanged.
pub type ShorthandHook = Arc<dyn Fn(&Props) -> Option<Props> + Send + Sync>;

/// Options for compiling a definition
#[derive(Clone)]
pub struct Options {
    /// Named pipelines; compiled only when an `$apply` refers to them
    pub pipelines: IndexMap<String, serde_json::Value>,
    /// Transform functions by name
    pub transformers: HashMap<String, Transformer>,
    /// Lookup tables for the `map` transformer
    pub dictionaries: HashMap<String, Dictionary>,
    /// Values treated as "no result"
    pub nonvalues: Vec<Value>,
    /// Extra spelling accepted for `$direction: "fwd"`
    pub fwd_alias: Option<String>,
    /// Extra spelling accepted for `$direction: "rev"`
    pub rev_alias: Option<String>,
    /// Run with `noDefaults` everywhere
    pub no_defaults: bool,
    /// Caller supplied shorthand rewrite
    pub shorthand: Option<ShorthandHook>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            pipelines: IndexMap::new(),
            transformers: built_in::transformers(),
            dictionaries: HashMap::new(),
            nonvalues: vec![Value::Undefined],
            fwd_alias: None,
            rev_alias: None,
            no_defaults: false,
            shorthand: None,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named pipeline definition
    pub fn with_pipeline(mut self, id: impl Into<String>, definition: serde_json::Value) -> Self {
        self.pipelines.insert(id.into(), definition);
        self
    }

    /// Register a transformer, replacing any built-in of the same name
    pub fn with_transformer(mut self, name: impl Into<String>, transformer: Transformer) -> Self {
        self.transformers.insert(name.into(), transformer);
        self
    }

    pub fn with_dictionary(mut self, name: impl Into<String>, dictionary: Dictionary) -> Self {
        self.dictionaries.insert(name.into(), dictionary);
        self
    }

    pub fn with_nonvalues(mut self, nonvalues: Vec<Value>) -> Self {
        self.nonvalues = nonvalues;
        self
    }

    pub fn with_direction_aliases(
        mut self,
        fwd: Option<impl Into<String>>,
        rev: Option<impl Into<String>>,
    ) -> Self {
        self.fwd_alias = fwd.map(Into::into);
        self.rev_alias = rev.map(Into::into);
        self
    }

    pub fn with_no_defaults(mut self, no_defaults: bool) -> Self {
        self.no_defaults = no_defaults;
        self
    }

    pub fn with_shorthand(mut self, hook: ShorthandHook) -> Self {
        self.shorthand = Some(hook);
        self
    }

    /// Parse a `$direction` value
    pub fn parse_direction(&self, text: &str) -> Option<Direction> {
        if text == "fwd" || self.fwd_alias.as_deref() == Some(text) {
            Some(Direction::Forward)
        } else if text == "rev" || self.rev_alias.as_deref() == Some(text) {
            Some(Direction::Reverse)
        } else {
            None
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut transformers: Vec<_> = self.transformers.keys().collect();
        transformers.sort();
        f.debug_struct("Options")
            .field("pipelines", &self.pipelines.keys().collect::<Vec<_>>())
            .field("transformers", &transformers)
            .field("dictionaries", &self.dictionaries.keys().collect::<Vec<_>>())
            .field("nonvalues", &self.nonvalues)
            .field("fwd_alias", &self.fwd_alias)
            .field("rev_alias", &self.rev_alias)
            .field("no_defaults", &self.no_defaults)
            .field("shorthand", &self.shorthand.is_some())
            .finish()
    }
}

/// Per-run options
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub direction: Direction,
    /// Existing structure to merge the result into
    pub target: Option<Value>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Forward,
            target: None,
        }
    }
}

impl RunOptions {
    pub fn forward() -> Self {
        Self::default()
    }

    pub fn reverse() -> Self {
        Self {
            direction: Direction::Reverse,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Value) -> Self {
        self.target = Some(target);
        self
    }
}
