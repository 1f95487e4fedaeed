//! Domain error types for facet and record operations.

use thiserror::Error;

/// Domain-specific errors for facet filtering and record decoding.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The search backend failed to answer a facet query.
    #[error("search backend error: {message}")]
    Backend { message: String },

    /// The authorization service could not evaluate a rule.
    #[error("authorization error for rule '{rule}': {message}")]
    Authorization { rule: String, message: String },

    /// A permission entry references a rule that is not defined.
    #[error("unknown permission rule: {rule}")]
    UnknownRule { rule: String },

    /// A positional schema cannot be used for decoding.
    #[error("invalid positional schema '{name}': {message}")]
    InvalidSchema { name: String, message: String },

    /// Facet or permission configuration is inconsistent.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Cache key material could not be serialized.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
