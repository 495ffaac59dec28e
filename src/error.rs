//! Error types for schema/code generation

use thiserror::Error;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Why a single type name could not be resolved.
///
/// Cloned into the resolution cache when a type enters the FAILED state, so
/// later lookups of the same name report the same outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Type not found: {name}")]
    NotFound { name: String },

    #[error("Type construction failed for {name}: {reason}")]
    ConstructionFailed { name: String, reason: String },

    #[error("Cyclic reference to {name} before a placeholder was registered")]
    CyclicReference { name: String },
}

impl ResolveError {
    /// Name of the type this failure belongs to
    pub fn type_name(&self) -> &str {
        match self {
            ResolveError::NotFound { name }
            | ResolveError::ConstructionFailed { name, .. }
            | ResolveError::CyclicReference { name } => name,
        }
    }

    pub(crate) fn construction(name: &str, reason: impl Into<String>) -> Self {
        ResolveError::ConstructionFailed {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Generation errors
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Invalid schema document: {0}")]
    InvalidDocument(String),

    #[error("Generation incomplete: {} type(s) failed", failures.len())]
    Incomplete { failures: Vec<ResolveError> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
