//! Error types for the ORM system
//!
//! Absence is expressed with `Option` and soft failures with `bool`; the types
//! here cover programming errors only. Collaborator failures ([`BackendError`])
//! are logged and translated by the query backends.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for ORM operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A hydrating builder operation was called without a bound model
    #[error("The model is not defined.")]
    ModelNotDefined,

    /// Neither the model nor its query backend handles the persistence action
    #[error("The \"{action}\" action is not supported in the [{model}]")]
    UnsupportedAction { action: String, model: String },

    /// Query building error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

impl ModelError {
    pub fn unsupported_action(action: &str, model: &str) -> Self {
        ModelError::UnsupportedAction {
            action: action.to_string(),
            model: model.to_string(),
        }
    }
}

/// Error types for query builder operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// The query var has no translation and the var store has no such operation
    #[error("Unsupported query [{name}]")]
    Unsupported { name: String },

    /// The query vars handed to a backend are of the wrong kind
    #[error("The query must be instance of the [{expected}]")]
    InvalidQueryVars { expected: &'static str },

    /// The query result handed to a backend is of the wrong kind
    #[error("The query result must be instance of the [{expected}]")]
    InvalidResult { expected: &'static str },

    /// A dynamic call received arguments it cannot use
    #[error("Invalid arguments for [{name}]: {reason}")]
    InvalidArguments { name: String, reason: String },
}

impl QueryError {
    pub fn unsupported(name: &str) -> Self {
        QueryError::Unsupported {
            name: name.to_string(),
        }
    }

    pub fn invalid_arguments(name: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidArguments {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Structured error reported by a collaborator, in the shape of `WP_Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

impl BackendError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for BackendError {}
