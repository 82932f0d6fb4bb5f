//! Error types for trader-core

use thiserror::Error;

/// Result type alias for trader-core
pub type Result<T> = std::result::Result<T, CoreError>;

/// Validation errors for core domain types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Path does not live under the `/v1/` API prefix
    #[error("Invalid API path '{0}': must start with /v1/")]
    InvalidPath(String),

    /// Unknown HTTP verb
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),
}
