//! Error types for completion calls

use thiserror::Error;

/// Result type alias for trader-llm
pub type Result<T> = std::result::Result<T, LLMError>;

/// Failures of a completion call
///
/// Callers in this workspace never surface these to the end user: the
/// intent resolver treats any of them as "no usable answer" and falls back
/// to deterministic extraction.
#[derive(Error, Debug)]
pub enum LLMError {
    /// Non-2xx status without a more specific mapping
    #[error("Completion endpoint failed: {0}")]
    RequestFailed(String),

    #[error("Completion endpoint rejected the API key")]
    AuthenticationFailed,

    #[error("Completion endpoint rate limit hit: {0}")]
    RateLimitExceeded(String),

    /// HTTP 400, or a model outside the configured allow-list
    #[error("Completion request rejected: {0}")]
    InvalidRequest(String),

    #[error("Unknown model: {0}")]
    ModelNotFound(String),

    #[error("Completion payload could not be (de)serialized: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Completion transport error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// 2xx response without a usable choice
    #[error("Malformed completion response: {0}")]
    UnexpectedResponse(String),

    #[error("Provider misconfigured: {0}")]
    ConfigurationError(String),
}

impl LLMError {
    /// Map a non-2xx completion status to an error
    pub fn from_status(status: u16, body: String, model: &str) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed,
            429 => Self::RateLimitExceeded(body),
            400 => Self::InvalidRequest(body),
            404 => Self::ModelNotFound(model.to_string()),
            _ => Self::RequestFailed(format!("HTTP {status}: {body}")),
        }
    }

    /// Whether the same request might succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::HttpError(_) => true,
            Self::RequestFailed(detail) => detail.starts_with("HTTP 5"),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            LLMError::from_status(401, String::new(), "m"),
            LLMError::AuthenticationFailed
        ));
        assert!(matches!(
            LLMError::from_status(404, String::new(), "openai/gpt-x"),
            LLMError::ModelNotFound(model) if model == "openai/gpt-x"
        ));
        assert!(matches!(
            LLMError::from_status(400, "bad".into(), "m"),
            LLMError::InvalidRequest(body) if body == "bad"
        ));

        let error = LLMError::from_status(502, "upstream".into(), "m");
        assert_eq!(error.to_string(), "Completion endpoint failed: HTTP 502: upstream");
    }

    #[test]
    fn test_transient_errors() {
        assert!(LLMError::from_status(503, String::new(), "m").is_transient());
        assert!(LLMError::from_status(429, String::new(), "m").is_transient());
        assert!(!LLMError::from_status(400, String::new(), "m").is_transient());
        assert!(!LLMError::AuthenticationFailed.is_transient());
    }
}
