//! Language-model abstraction for the trading assistant
//!
//! This crate provides provider-agnostic types for talking to a chat
//! completion endpoint. It includes:
//!
//! - Message types for the conversation
//! - Completion request/response types, including JSON response format
//! - The [`LLMProvider`] trait
//! - An OpenRouter (OpenAI-compatible) provider
//! - Per-model cost accounting

pub mod completion;
pub mod error;
pub mod messages;
pub mod pricing;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{
    CompletionRequest, CompletionResponse, ResponseFormat, StopReason, TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use pricing::{ModelPricing, calculate_cost};
pub use provider::LLMProvider;
