//! Normalised brokerage responses
//!
//! Every gateway call ends in an [`ApiResponse`]. The payload is kept as an
//! opaque JSON value; only the handful of shapes the gateway produces
//! itself are given names here:
//!
//! | shape         | fields                                   |
//! |---------------|------------------------------------------|
//! | empty success | `status: "success"`, `message`           |
//! | HTTP error    | `error`, `statusCode`, `details`         |
//! | other failure | `error`, `type`                          |
//! | cancelled     | `status: "cancelled"`, `message`         |

use crate::error::GatewayError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Opaque brokerage payload or one of the structured error shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiResponse(Value);

impl ApiResponse {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Stand-in for a successful call with an empty body
    pub fn success_empty() -> Self {
        Self(json!({"status": "success", "message": "Operation completed"}))
    }

    /// Non-success HTTP status; `body` is kept as JSON when it parses, as text otherwise
    pub fn http_error(status: u16, body: &str) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown Status");
        let details = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
        };

        Self(json!({
            "error": format!("HTTP {status} {reason}"),
            "statusCode": status,
            "details": details,
        }))
    }

    /// Any failure that is not an HTTP status
    pub fn failure(message: impl Into<String>, kind: &str) -> Self {
        Self(json!({"error": message.into(), "type": kind}))
    }

    /// Fold a gateway error into its structured shape
    pub fn from_error(error: &GatewayError) -> Self {
        match error {
            GatewayError::Http { status, body } => Self::http_error(*status, body),
            other => Self::failure(other.to_string(), other.kind()),
        }
    }

    /// Mutating call the user declined
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self(json!({"status": "cancelled", "message": message.into()}))
    }

    pub fn is_error(&self) -> bool {
        self.0.get("error").is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get("status").and_then(Value::as_str) == Some("cancelled")
    }

    pub fn error_message(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.0
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }

    pub fn error_kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn details(&self) -> Option<&Value> {
        self.0.get("details")
    }

    /// Bar data, if the payload has the expected list shape
    ///
    /// Accepts either a bare array or an object with a `bars` array.
    pub fn as_bars(&self) -> Option<&[Value]> {
        match &self.0 {
            Value::Array(items) => Some(items),
            Value::Object(map) => map.get("bars").and_then(Value::as_array).map(Vec::as_slice),
            _ => None,
        }
    }

    /// First string found under any of `keys`
    pub fn string_field(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ApiResponse {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.0) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}
