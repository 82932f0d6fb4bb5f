//! Configuration for the gateway client

use crate::error::{GatewayError, Result};
use crate::retry::RetryPolicy;
use std::time::Duration;
use trader_utils::Settings;
use trader_utils::config::DEFAULT_FINAM_API_BASE_URL;
use url::Url;

/// Configuration for [`crate::GatewayClient`]
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// REST base URL, without trailing slash
    pub base_url: String,

    /// Initial session token
    pub access_token: Option<String>,

    /// Secret exchanged for a fresh session token
    pub secret: Option<String>,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// How long a session token is trusted after it was obtained
    pub credential_ttl: Duration,

    /// Retry policy for transient failures
    pub retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FINAM_API_BASE_URL.to_string(),
            access_token: None,
            secret: None,
            request_timeout: Duration::from_secs(30),
            credential_ttl: Duration::from_secs(15 * 60), // 15 minutes
            retry: RetryPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration builder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Gateway settings taken from the shared environment settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut builder = Self::builder().base_url(&settings.finam_api_base_url);
        if let Some(token) = &settings.finam_access_token {
            builder = builder.access_token(token);
        }
        if let Some(secret) = &settings.finam_secret {
            builder = builder.secret(secret);
        }
        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            GatewayError::Config(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }

        if self.credential_ttl.is_zero() {
            return Err(GatewayError::Config(
                "credential_ttl must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(GatewayError::Config(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Absolute URL for an API path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Builder for GatewayConfig
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    base_url: Option<String>,
    access_token: Option<String>,
    secret: Option<String>,
    request_timeout: Option<Duration>,
    credential_ttl: Option<Duration>,
    retry: Option<RetryPolicy>,
}

impl GatewayConfigBuilder {
    /// Set the REST base URL
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = Some(url.as_ref().trim_end_matches('/').to_string());
        self
    }

    /// Set the initial session token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the refresh secret
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set how long a token is trusted
    pub fn credential_ttl(mut self, duration: Duration) -> Self {
        self.credential_ttl = Some(duration);
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<GatewayConfig> {
        let defaults = GatewayConfig::default();

        let config = GatewayConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            access_token: self.access_token,
            secret: self.secret,
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            credential_ttl: self.credential_ttl.unwrap_or(defaults.credential_ttl),
            retry: self.retry.unwrap_or(defaults.retry),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "https://api.finam.ru");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.credential_ttl, Duration::from_secs(900));
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_trims_base_url() {
        let config = GatewayConfig::builder()
            .base_url("http://localhost:8080/")
            .access_token("t0")
            .build()
            .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(
            config.url_for("/v1/assets"),
            "http://localhost:8080/v1/assets"
        );
        assert_eq!(config.access_token.as_deref(), Some("t0"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(GatewayConfig::builder().base_url("ftp://host").build().is_err());
        for malformed in ["https://", "http//api.test", "https://exa mple.com", "httpx"] {
            assert!(
                GatewayConfig::builder().base_url(malformed).build().is_err(),
                "{malformed} accepted"
            );
        }
        assert!(
            GatewayConfig::builder()
                .base_url("http://localhost:8080")
                .build()
                .is_ok()
        );
        assert!(
            GatewayConfig::builder()
                .credential_ttl(Duration::ZERO)
                .build()
                .is_err()
        );
        assert!(
            GatewayConfig::builder()
                .retry(RetryPolicy {
                    max_attempts: 0,
                    ..RetryPolicy::default()
                })
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            finam_access_token: Some("tok".into()),
            finam_secret: Some("sec".into()),
            finam_api_base_url: "https://sandbox.example".into(),
            ..Settings::default()
        };
        let config = GatewayConfig::from_settings(&settings).unwrap();

        assert_eq!(config.base_url, "https://sandbox.example");
        assert_eq!(config.access_token.as_deref(), Some("tok"));
        assert_eq!(config.secret.as_deref(), Some("sec"));
    }
}
