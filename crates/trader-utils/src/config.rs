//! Environment-based settings
//!
//! Settings are read from process environment variables, after loading an
//! optional `.env` file from the working directory.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_FINAM_API_BASE_URL: &str = "https://api.finam.ru";
pub const DEFAULT_OPENROUTER_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A base URL could not be parsed or has an unsupported scheme
    #[error("Invalid URL in {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    /// A required value is missing
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

/// Settings shared by the gateway client, the language-model provider and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Brokerage access token (`FINAM_ACCESS_TOKEN`)
    pub finam_access_token: Option<String>,

    /// Brokerage secret used to mint fresh session tokens (`FINAM_SECRET`)
    pub finam_secret: Option<String>,

    /// Brokerage REST base URL (`FINAM_API_BASE_URL`)
    pub finam_api_base_url: String,

    /// Default trading account (`FINAM_ACCOUNT_ID`)
    pub finam_account_id: Option<String>,

    /// Language-model API key (`OPENROUTER_API_KEY`)
    pub openrouter_api_key: Option<String>,

    /// Language-model base URL (`OPENROUTER_BASE`)
    pub openrouter_base: String,

    /// Language-model identifier (`OPENROUTER_MODEL`)
    pub openrouter_model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            finam_access_token: None,
            finam_secret: None,
            finam_api_base_url: DEFAULT_FINAM_API_BASE_URL.to_string(),
            finam_account_id: None,
            openrouter_api_key: None,
            openrouter_base: DEFAULT_OPENROUTER_BASE.to_string(),
            openrouter_model: DEFAULT_OPENROUTER_MODEL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let settings = Self {
            finam_access_token: non_empty("FINAM_ACCESS_TOKEN"),
            finam_secret: non_empty("FINAM_SECRET"),
            finam_api_base_url: non_empty("FINAM_API_BASE_URL")
                .unwrap_or(defaults.finam_api_base_url),
            finam_account_id: non_empty("FINAM_ACCOUNT_ID"),
            openrouter_api_key: non_empty("OPENROUTER_API_KEY"),
            openrouter_base: non_empty("OPENROUTER_BASE").unwrap_or(defaults.openrouter_base),
            openrouter_model: non_empty("OPENROUTER_MODEL").unwrap_or(defaults.openrouter_model),
        }
        .normalized();

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("FINAM_API_BASE_URL", &self.finam_api_base_url)?;
        validate_url("OPENROUTER_BASE", &self.openrouter_base)?;

        if self.openrouter_model.is_empty() {
            return Err(ConfigError::Missing("OPENROUTER_MODEL"));
        }

        Ok(())
    }

    /// Language-model API key, or an error naming the missing variable
    pub fn require_openrouter_key(&self) -> Result<&str, ConfigError> {
        self.openrouter_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))
    }

    fn normalized(mut self) -> Self {
        self.finam_api_base_url = self.finam_api_base_url.trim_end_matches('/').to_string();
        self.openrouter_base = self.openrouter_base.trim_end_matches('/').to_string();
        self
    }
}

fn validate_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.require_openrouter_key().is_err());
    }

    #[test]
    fn test_values_are_read_and_trimmed() {
        let settings = Settings::from_lookup(lookup(&[
            ("FINAM_ACCESS_TOKEN", " tok "),
            ("FINAM_API_BASE_URL", "http://localhost:8080/"),
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENROUTER_MODEL", "openai/gpt-4o"),
            ("FINAM_ACCOUNT_ID", ""),
        ]))
        .unwrap();

        assert_eq!(settings.finam_access_token.as_deref(), Some("tok"));
        assert_eq!(settings.finam_api_base_url, "http://localhost:8080");
        assert_eq!(settings.require_openrouter_key(), Ok("sk-test"));
        assert_eq!(settings.openrouter_model, "openai/gpt-4o");
        assert_eq!(settings.finam_account_id, None);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = Settings::from_lookup(lookup(&[("FINAM_API_BASE_URL", "ftp://example.com")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidUrl {
                var: "FINAM_API_BASE_URL",
                ..
            })
        ));

        let result = Settings::from_lookup(lookup(&[("OPENROUTER_BASE", "not a url")]));
        assert!(result.is_err());
    }
}
