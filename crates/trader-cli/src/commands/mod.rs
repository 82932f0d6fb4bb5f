//! Subcommand implementations

pub mod ask;
pub mod metrics;
pub mod submit;

use anyhow::{Context, Result};
use std::sync::Arc;
use trader_intent::{IntentResolver, ResolverConfig};
use trader_llm::providers::openrouter::{OpenRouterConfig, OpenRouterProvider};
use trader_utils::Settings;

/// Resolver backed by OpenRouter, configured from the environment
pub fn resolver(settings: &Settings) -> Result<IntentResolver> {
    let provider = OpenRouterProvider::with_config(
        OpenRouterConfig::new(settings.require_openrouter_key()?)
            .with_api_base(&settings.openrouter_base),
    )
    .context("failed to create language-model provider")?;

    let mut config = ResolverConfig::new(&settings.openrouter_model);
    if let Some(account_id) = &settings.finam_account_id {
        config = config.with_account_id(account_id);
    }

    Ok(IntentResolver::new(Arc::new(provider), config)?)
}
