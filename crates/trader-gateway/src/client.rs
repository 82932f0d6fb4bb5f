//! Gateway client: credential refresh, retry and response normalisation

use crate::config::GatewayConfig;
use crate::credential::{Clock, CredentialStore, SystemClock};
use crate::error::{GatewayError, Result};
use crate::response::ApiResponse;
use crate::transport::{ApiRequest, RawResponse, ReqwestTransport, Transport};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use trader_core::HttpMethod;

const SESSIONS_PATH: &str = "/v1/sessions";

/// Query string and JSON body of a call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present
    pub fn query_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Set the JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }
}

/// Client for the brokerage REST API
///
/// [`GatewayClient::execute`] never fails: transport problems, HTTP errors
/// and undecodable bodies all come back as structured [`ApiResponse`]s.
pub struct GatewayClient {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    credential: CredentialStore,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.config.base_url)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Client using the reqwest transport and the system clock
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(
            config,
            Arc::new(transport),
            Arc::new(SystemClock),
        ))
    }

    /// Client over an arbitrary transport and clock
    pub fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = chrono::Duration::from_std(config.credential_ttl)
            .unwrap_or_else(|_| chrono::Duration::minutes(15));
        let credential = CredentialStore::new(config.access_token.clone(), clock.now(), ttl);

        Self {
            config,
            transport,
            credential,
            clock,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn credential(&self) -> &CredentialStore {
        &self.credential
    }

    /// Send one request, refreshing the session token first if it has expired
    #[instrument(skip(self, options))]
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> ApiResponse {
        self.ensure_fresh_credential().await;
        self.send(method, path, &options).await
    }

    /// Mint a new session token through `POST /v1/sessions`
    ///
    /// Expiry only moves forward when the response carries a token; a
    /// failed refresh leaves the old credential in place.
    pub async fn refresh_credential(&self) -> ApiResponse {
        let _guard = self.credential.begin_refresh().await;
        self.refresh_locked().await
    }

    async fn ensure_fresh_credential(&self) {
        if !self.credential.is_expired_at(self.clock.now()).await {
            return;
        }

        let _guard = self.credential.begin_refresh().await;
        // Another task may have refreshed while we waited for the guard
        if !self.credential.is_expired_at(self.clock.now()).await {
            return;
        }

        let response = self.refresh_locked().await;
        if response.is_error() {
            warn!(
                "Session refresh failed, continuing with stale credential: {}",
                response.error_message().unwrap_or("unknown error")
            );
        }
    }

    async fn refresh_locked(&self) -> ApiResponse {
        debug!("Refreshing session token");

        let mut options = RequestOptions::new();
        if let Some(secret) = &self.config.secret {
            options = options.json(json!({ "secret": secret }));
        }

        let response = self.send(HttpMethod::Post, SESSIONS_PATH, &options).await;
        match response.string_field(&["token", "access_token"]) {
            Some(token) => {
                let now = self.clock.now();
                self.credential.install(token.to_string(), now).await;
                info!(
                    "Session token refreshed, valid until {}",
                    now + self.credential.ttl()
                );
            }
            None if !response.is_error() => {
                warn!("Session response did not contain a token");
            }
            None => {}
        }

        response
    }

    /// Build, retry and normalise one call; no credential check
    async fn send(&self, method: HttpMethod, path: &str, options: &RequestOptions) -> ApiResponse {
        let request = ApiRequest::new(method, self.config.url_for(path))
            .with_token(self.credential.token().await)
            .with_query(options.query.clone())
            .with_body(options.json.clone());

        let transport = self.transport.as_ref();
        let request = &request;
        let outcome = self
            .config
            .retry
            .execute(&format!("{method} {path}"), move || async move {
                let raw = transport.send(request).await?;
                if matches!(raw.status, 500 | 503) {
                    return Err(GatewayError::Http {
                        status: raw.status,
                        body: raw.body,
                    });
                }
                Ok(raw)
            })
            .await;

        match outcome {
            Ok(raw) => normalize(raw),
            Err(error) => ApiResponse::from_error(&error),
        }
    }
}

fn normalize(raw: RawResponse) -> ApiResponse {
    if !raw.is_success() {
        debug!("HTTP {} returned as structured error", raw.status);
        return ApiResponse::http_error(raw.status, &raw.body);
    }

    if raw.body.trim().is_empty() {
        return ApiResponse::success_empty();
    }

    match serde_json::from_str::<Value>(&raw.body) {
        Ok(value) => ApiResponse::new(value),
        Err(e) => ApiResponse::from_error(&GatewayError::Decode(e.to_string())),
    }
}
