//! Error types for trader-intent

use thiserror::Error;

/// Result type alias for trader-intent
pub type Result<T> = std::result::Result<T, IntentError>;

/// Errors raised while loading datasets, rendering prompts or writing reports
///
/// Resolution itself never fails: an unusable model answer falls back to
/// the deterministic extractor instead of producing one of these.
#[derive(Error, Debug)]
pub enum IntentError {
    /// Dataset file could not be opened or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Prompt template failed to render
    #[error("Template '{name}' failed to render: {detail}")]
    Template { name: String, detail: String },

    /// Model answer could not be turned into an intent
    #[error("Unusable model answer: {0}")]
    UnusableAnswer(String),

    /// Invalid symbol pattern or other resolver setting
    #[error("Invalid resolver configuration: {0}")]
    Config(String),

    /// Language-model call failed
    #[error(transparent)]
    Llm(#[from] trader_llm::LLMError),

    /// Domain validation failure
    #[error(transparent)]
    Core(#[from] trader_core::CoreError),
}

impl IntentError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
