//! Cost accounting for completion calls
//!
//! Prices are approximate OpenRouter list prices in US dollars per one
//! million tokens.

use crate::TokenUsage;

/// Per-million-token prices for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub prompt: f64,
    pub completion: f64,
}

const PRICE_TABLE: &[(&str, ModelPricing)] = &[
    ("openai/gpt-4o-mini", ModelPricing { prompt: 0.15, completion: 0.60 }),
    ("openai/gpt-4o", ModelPricing { prompt: 2.50, completion: 10.00 }),
    ("openai/gpt-3.5-turbo", ModelPricing { prompt: 0.50, completion: 1.50 }),
    ("anthropic/claude-3-sonnet", ModelPricing { prompt: 3.00, completion: 15.00 }),
    ("anthropic/claude-3-haiku", ModelPricing { prompt: 0.25, completion: 1.25 }),
];

impl ModelPricing {
    /// Prices for `model`; unknown models are priced as gpt-4o-mini
    pub fn for_model(model: &str) -> Self {
        PRICE_TABLE
            .iter()
            .find(|(name, _)| *name == model)
            .map_or(PRICE_TABLE[0].1, |(_, pricing)| *pricing)
    }
}

/// Dollar cost of a single completion call
pub fn calculate_cost(usage: &TokenUsage, model: &str) -> f64 {
    let pricing = ModelPricing::for_model(model);
    let prompt = usage.input_tokens as f64 / 1_000_000.0 * pricing.prompt;
    let completion = usage.output_tokens as f64 / 1_000_000.0 * pricing.completion;
    prompt + completion
}
