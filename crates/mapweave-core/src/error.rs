//! Error types for the Mapweave core library
//!
//! Only definition problems are errors. Missing properties, out-of-range
//! indices and type mismatches met while traversing data degrade to
//! [`Value::Undefined`](crate::Value::Undefined) instead.

use thiserror::Error;

/// Main error type for Mapweave operations
#[derive(Error, Debug)]
pub enum Error {
    /// `$apply` referenced an id that has no registered pipeline
    #[error("Pipeline not found: '{id}'")]
    PipelineNotFound { id: String },

    /// `$transform` referenced a transformer that is not registered
    #[error("Transformer not found: '{name}'")]
    TransformerNotFound { name: String },

    /// A definition construct is malformed
    #[error("Invalid definition for {operator}: {message}")]
    InvalidDefinition { operator: String, message: String },

    /// A path-only API was given something other than a path
    #[error("Invalid path: {message} (found {found})")]
    InvalidPath { message: String, found: String },

    /// A hand-built pipeline contains a step the interpreter cannot run
    #[error("Invalid pipeline: {message}")]
    InvalidPipeline { message: String },

    /// A plugged-in transform function failed
    #[error("Transformer '{name}' failed: {source}")]
    Transformer {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The synchronous driver met a value that was still pending
    #[error("Deferred value in synchronous run: {operation} did not resolve immediately")]
    DeferredInSync { operation: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid definition error for an operator
    pub fn invalid_definition(operator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            operator: operator.into(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary failure raised inside a transform function
    pub fn transformer(name: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Transformer {
            name: name.into(),
            source: source.into(),
        }
    }

    /// True for errors caused by the definition rather than by a collaborator
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            Self::PipelineNotFound { .. }
                | Self::TransformerNotFound { .. }
                | Self::InvalidDefinition { .. }
                | Self::InvalidPath { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            message: source.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_not_found_names_id() {
        let err = Error::PipelineNotFound {
            id: "comment".to_string(),
        };
        assert!(err.to_string().contains("'comment'"));
        assert!(err.is_definition_error());
    }

    #[test]
    fn test_transformer_error_keeps_source() {
        let err = Error::transformer("upper", anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "Transformer 'upper' failed: boom");
        assert!(!err.is_definition_error());
        assert!(std::error::Error::source(&err).is_some());
    }
}
