//! Error types for gateway operations
//!
//! These never cross [`crate::GatewayClient::execute`]; they are folded into
//! structured [`crate::ApiResponse`] values at the boundary.

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors raised inside the gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Connection could not be established or was interrupted
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request exceeded its timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body was not valid JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Client configuration is unusable
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Short kind name reported in the `type` field of structured errors
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TransportError",
            Self::Timeout(_) => "Timeout",
            Self::Http { .. } => "HttpError",
            Self::Decode(_) => "DecodeError",
            Self::Config(_) => "ConfigError",
        }
    }

    /// Transient conditions worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Http { status, .. } => matches!(status, 500 | 503),
            Self::Decode(_) | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Config(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GatewayError::Transport("reset".into()).is_transient());
        assert!(GatewayError::Timeout("30s".into()).is_transient());
        for status in [500, 503] {
            assert!(GatewayError::Http { status, body: String::new() }.is_transient());
        }
        for status in [400, 401, 404, 429, 502] {
            assert!(!GatewayError::Http { status, body: String::new() }.is_transient());
        }
        assert!(!GatewayError::Decode("eof".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::Http {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
        assert_eq!(err.kind(), "HttpError");
    }
}
