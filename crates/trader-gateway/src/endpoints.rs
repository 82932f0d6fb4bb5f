//! Endpoint catalog
//!
//! Thin wrappers over [`GatewayClient::execute`] for the brokerage's fixed
//! `/v1/` endpoints. Interval filters use the API's dotted query names
//! (`interval.start_time`, `interval.end_time`).

use crate::client::{GatewayClient, RequestOptions};
use crate::response::ApiResponse;
use serde_json::{Value, json};
use trader_core::HttpMethod;

/// Default order book depth
pub const DEFAULT_ORDERBOOK_DEPTH: u32 = 10;

/// Default bar timeframe
pub const DEFAULT_TIMEFRAME: &str = "TIME_FRAME_D";

/// Timeframes accepted by the bars endpoint
pub const TIMEFRAMES: &[&str] = &[
    "TIME_FRAME_M1",
    "TIME_FRAME_M5",
    "TIME_FRAME_M15",
    "TIME_FRAME_M30",
    "TIME_FRAME_H1",
    "TIME_FRAME_H4",
    "TIME_FRAME_D",
    "TIME_FRAME_W",
    "TIME_FRAME_MN",
];

fn interval(start: Option<&str>, end: Option<&str>) -> RequestOptions {
    RequestOptions::new()
        .query_opt("interval.start_time", start)
        .query_opt("interval.end_time", end)
}

impl GatewayClient {
    async fn get(&self, path: &str) -> ApiResponse {
        self.execute(HttpMethod::Get, path, RequestOptions::new())
            .await
    }

    /// List exchanges
    pub async fn exchanges(&self) -> ApiResponse {
        self.get("/v1/exchanges").await
    }

    /// Search instruments
    pub async fn assets(&self) -> ApiResponse {
        self.get("/v1/assets").await
    }

    /// Instrument details, optionally scoped to an account
    pub async fn asset(&self, symbol: &str, account_id: Option<&str>) -> ApiResponse {
        let options = RequestOptions::new().query_opt("account_id", account_id);
        self.execute(HttpMethod::Get, &format!("/v1/assets/{symbol}"), options)
            .await
    }

    /// Trading parameters of an instrument for an account
    pub async fn asset_params(&self, symbol: &str, account_id: Option<&str>) -> ApiResponse {
        let options = RequestOptions::new().query_opt("account_id", account_id);
        self.execute(
            HttpMethod::Get,
            &format!("/v1/assets/{symbol}/params"),
            options,
        )
        .await
    }

    pub async fn asset_schedule(&self, symbol: &str) -> ApiResponse {
        self.get(&format!("/v1/assets/{symbol}/schedule")).await
    }

    /// Options on an underlying
    pub async fn asset_options(&self, symbol: &str) -> ApiResponse {
        self.get(&format!("/v1/assets/{symbol}/options")).await
    }

    /// Latest quote
    pub async fn quote(&self, symbol: &str) -> ApiResponse {
        self.get(&format!("/v1/instruments/{symbol}/quotes/latest"))
            .await
    }

    /// Order book up to `depth` levels
    pub async fn orderbook(&self, symbol: &str, depth: u32) -> ApiResponse {
        let options = RequestOptions::new().query("depth", depth);
        self.execute(
            HttpMethod::Get,
            &format!("/v1/instruments/{symbol}/orderbook"),
            options,
        )
        .await
    }

    pub async fn latest_trades(&self, symbol: &str) -> ApiResponse {
        self.get(&format!("/v1/instruments/{symbol}/trades/latest"))
            .await
    }

    /// Historical bars for `timeframe` (one of [`TIMEFRAMES`])
    pub async fn bars(
        &self,
        symbol: &str,
        timeframe: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> ApiResponse {
        let mut options = interval(start, end);
        options.query.insert(0, ("timeframe".to_string(), timeframe.to_string()));
        self.execute(
            HttpMethod::Get,
            &format!("/v1/instruments/{symbol}/bars"),
            options,
        )
        .await
    }

    /// Account summary
    pub async fn account(&self, account_id: &str) -> ApiResponse {
        self.get(&format!("/v1/accounts/{account_id}")).await
    }

    /// Open positions; the brokerage reports them inside the account summary
    pub async fn positions(&self, account_id: &str) -> ApiResponse {
        self.account(account_id).await
    }

    pub async fn orders(&self, account_id: &str) -> ApiResponse {
        self.get(&format!("/v1/accounts/{account_id}/orders")).await
    }

    pub async fn order(&self, account_id: &str, order_id: &str) -> ApiResponse {
        self.get(&format!("/v1/accounts/{account_id}/orders/{order_id}"))
            .await
    }

    /// Place an order
    ///
    /// Mutating: callers are expected to have obtained user confirmation.
    pub async fn create_order(&self, account_id: &str, order: Value) -> ApiResponse {
        self.execute(
            HttpMethod::Post,
            &format!("/v1/accounts/{account_id}/orders"),
            RequestOptions::new().json(order),
        )
        .await
    }

    /// Cancel an order
    ///
    /// Mutating: callers are expected to have obtained user confirmation.
    pub async fn cancel_order(&self, account_id: &str, order_id: &str) -> ApiResponse {
        self.execute(
            HttpMethod::Delete,
            &format!("/v1/accounts/{account_id}/orders/{order_id}"),
            RequestOptions::new(),
        )
        .await
    }

    /// Executed trades in an optional interval
    pub async fn trades(
        &self,
        account_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> ApiResponse {
        self.execute(
            HttpMethod::Get,
            &format!("/v1/accounts/{account_id}/trades"),
            interval(start, end),
        )
        .await
    }

    /// Cash movements in an optional interval
    pub async fn transactions(
        &self,
        account_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> ApiResponse {
        self.execute(
            HttpMethod::Get,
            &format!("/v1/accounts/{account_id}/transactions"),
            interval(start, end),
        )
        .await
    }

    /// Open a new session and adopt its token
    pub async fn create_session(&self) -> ApiResponse {
        self.refresh_credential().await
    }

    /// Details of the current session token
    pub async fn session_details(&self) -> ApiResponse {
        let token = self.credential().token().await.unwrap_or_default();
        self.execute(
            HttpMethod::Post,
            "/v1/sessions/details",
            RequestOptions::new().json(json!({ "token": token })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::credential::SystemClock;
    use crate::retry::RetryPolicy;
    use crate::transport::{ApiRequest, MockTransport, RawResponse};
    use std::sync::Arc;

    fn client_expecting<F>(check: F) -> GatewayClient
    where
        F: Fn(&ApiRequest) -> bool + Send + 'static,
    {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(check)
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, "{}")));

        let config = GatewayConfig::builder()
            .base_url("https://api.test")
            .access_token("tok")
            .retry(RetryPolicy::no_retry())
            .build()
            .unwrap();
        GatewayClient::with_transport(config, Arc::new(transport), Arc::new(SystemClock))
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[tokio::test]
    async fn test_quote_path() {
        let client = client_expecting(|r| {
            r.method == HttpMethod::Get
                && r.url == "https://api.test/v1/instruments/SBER@MISX/quotes/latest"
        });
        client.quote("SBER@MISX").await;
    }

    #[tokio::test]
    async fn test_orderbook_depth() {
        let client = client_expecting(|r| {
            r.url.ends_with("/v1/instruments/GAZP@MISX/orderbook")
                && r.query == vec![pair("depth", "10")]
        });
        client.orderbook("GAZP@MISX", DEFAULT_ORDERBOOK_DEPTH).await;
    }

    #[tokio::test]
    async fn test_bars_query() {
        let client = client_expecting(|r| {
            r.url.ends_with("/v1/instruments/SBER@MISX/bars")
                && r.query
                    == vec![
                        pair("timeframe", "TIME_FRAME_H1"),
                        pair("interval.start_time", "2024-01-01T00:00:00Z"),
                    ]
        });
        client
            .bars("SBER@MISX", "TIME_FRAME_H1", Some("2024-01-01T00:00:00Z"), None)
            .await;
    }

    #[tokio::test]
    async fn test_create_order_posts_body() {
        let client = client_expecting(|r| {
            r.method == HttpMethod::Post
                && r.url.ends_with("/v1/accounts/A1/orders")
                && r.body == Some(json!({"symbol": "SBER@MISX", "quantity": {"value": "10"}}))
        });
        client
            .create_order("A1", json!({"symbol": "SBER@MISX", "quantity": {"value": "10"}}))
            .await;
    }

    #[tokio::test]
    async fn test_cancel_order_uses_delete() {
        let client = client_expecting(|r| {
            r.method == HttpMethod::Delete && r.url.ends_with("/v1/accounts/A1/orders/ORD-7")
        });
        client.cancel_order("A1", "ORD-7").await;
    }

    #[tokio::test]
    async fn test_session_details_sends_current_token() {
        let client = client_expecting(|r| {
            r.url.ends_with("/v1/sessions/details") && r.body == Some(json!({"token": "tok"}))
        });
        client.session_details().await;
    }

    #[tokio::test]
    async fn test_asset_params_account_scope() {
        let client = client_expecting(|r| {
            r.url.ends_with("/v1/assets/YNDX@MISX/params") && r.query == vec![pair("account_id", "A1")]
        });
        client.asset_params("YNDX@MISX", Some("A1")).await;
    }

    #[test]
    fn test_timeframes_include_default() {
        assert!(TIMEFRAMES.contains(&DEFAULT_TIMEFRAME));
    }
}
