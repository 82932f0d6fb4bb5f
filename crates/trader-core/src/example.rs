//! Few-shot training records

use serde::{Deserialize, Serialize};

/// A labeled `(question, method, path)` triple
///
/// `kind` keeps the raw method string from the dataset so that records
/// with unusual verbs still round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Natural-language question
    pub question: String,

    /// HTTP method, e.g. `GET`
    #[serde(rename = "type")]
    pub kind: String,

    /// Request path, e.g. `/v1/exchanges`
    pub request: String,
}

impl Example {
    pub fn new(
        question: impl Into<String>,
        kind: impl Into<String>,
        request: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            kind: kind.into(),
            request: request.into(),
        }
    }

    /// Case-insensitive check of the example's method
    pub fn is_method(&self, method: crate::HttpMethod) -> bool {
        self.kind.trim().eq_ignore_ascii_case(method.as_str())
    }
}
