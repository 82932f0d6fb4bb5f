//! Intent resolution for the trading assistant
//!
//! This crate turns Russian-language questions into validated brokerage
//! requests and sends them. It includes:
//!
//! - Prompt templates embedding the endpoint catalog
//! - Lenient parsing of model answers ([`parse`])
//! - The [`IntentResolver`] with its deterministic fallback
//! - Few-shot dataset loading and balanced example selection
//! - The confirmation-gated [`Dispatcher`]
//! - Batch submission generation and accuracy metrics

pub mod dataset;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod parser;
pub mod prompt;
pub mod resolver;
pub mod submission;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use dataset::{Question, load_examples, load_questions, select_balanced};
pub use dispatch::{AutoApprove, AutoDecline, Confirm, DispatchOutcome, Dispatcher};
pub use error::{IntentError, Result};
pub use metrics::{LabeledRequest, MetricsReport, evaluate, load_labeled, normalize_request};
pub use parser::{DEFAULT_PATH, ParsedRequest, parse};
pub use prompt::{API_ENDPOINTS, ApiEndpoint, PromptBuilder};
pub use resolver::{IntentResolver, ResolverConfig};
pub use submission::{Submission, SubmissionReport, SubmissionRow};
