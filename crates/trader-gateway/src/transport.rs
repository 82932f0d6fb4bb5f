//! HTTP transport seam
//!
//! [`Transport`] performs exactly one network round trip. Retries, token
//! refresh and response shaping live above it in [`crate::GatewayClient`].

use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use trader_core::HttpMethod;
use tracing::{debug, instrument};

/// A fully-built outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Sent verbatim in the `Authorization` header when present
    pub token: Option<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            token: None,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }
}

/// Status and undecoded body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One network round trip
///
/// Implementations return `Err` only when no HTTP response was received;
/// every status code, success or not, comes back as a [`RawResponse`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// [`Transport`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(to_reqwest(request.method), &request.url)
            .header("Content-Type", "application/json");

        // The brokerage expects the bare token, no scheme prefix
        if let Some(token) = &request.token {
            builder = builder.header("Authorization", token);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(GatewayError::from)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(GatewayError::from)?;

        debug!("Received HTTP {} ({} bytes)", status, body.len());
        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::new(HttpMethod::Post, "https://api.finam.ru/v1/sessions")
            .with_token(Some("abc".into()))
            .with_body(Some(json!({"secret": "s"})));

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.token.as_deref(), Some("abc"));
        assert!(request.query.is_empty());
        assert_eq!(request.body, Some(json!({"secret": "s"})));
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(301, "").is_success());
        assert!(!RawResponse::new(503, "").is_success());
    }

    #[test]
    fn test_method_mapping() {
        for method in HttpMethod::ALL {
            assert_eq!(to_reqwest(method).as_str(), method.as_str());
        }
    }

    #[test]
    fn test_transport_builds() {
        assert!(ReqwestTransport::new(Duration::from_secs(30)).is_ok());
    }
}
