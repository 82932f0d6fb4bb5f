//! Confirmation-gated dispatch of resolved intents
//!
//! The [`Dispatcher`] is the only path from a [`TradingIntent`] to the
//! gateway. Mutating intents are sent only after the supplied [`Confirm`]
//! capability approves them.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use trader_core::{HttpMethod, TradingIntent};
use trader_gateway::{ApiResponse, GatewayClient, RequestOptions};

/// Approval of a mutating call
pub trait Confirm: Send + Sync {
    fn confirm(&self, method: HttpMethod, path: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(HttpMethod, &str) -> bool + Send + Sync,
{
    fn confirm(&self, method: HttpMethod, path: &str) -> bool {
        self(method, path)
    }
}

/// Approves everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl Confirm for AutoApprove {
    fn confirm(&self, _method: HttpMethod, _path: &str) -> bool {
        true
    }
}

/// Declines everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecline;

impl Confirm for AutoDecline {
    fn confirm(&self, _method: HttpMethod, _path: &str) -> bool {
        false
    }
}

/// What happened to an intent
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The call was made (or refused locally) and produced this response
    Executed(ApiResponse),
    /// The user declined a mutating call
    Cancelled { method: HttpMethod, path: String },
}

impl DispatchOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Flatten into a response, rendering cancellation as `{status: "cancelled", message}`
    pub fn into_response(self) -> ApiResponse {
        match self {
            Self::Executed(response) => response,
            Self::Cancelled { method, path } => {
                ApiResponse::cancelled(format!("Операция отменена: {method} {path}"))
            }
        }
    }
}

/// Sends intents through the gateway
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Arc<GatewayClient>,
}

impl Dispatcher {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub async fn dispatch(&self, intent: &TradingIntent, confirm: &dyn Confirm) -> DispatchOutcome {
        let unresolved = intent.unresolved_placeholders();
        if !unresolved.is_empty() {
            warn!("Refusing to send {} with unresolved placeholders", intent.path());
            return DispatchOutcome::Executed(ApiResponse::failure(
                format!(
                    "Path {} has unresolved placeholders: {}",
                    intent.path(),
                    unresolved.join(", ")
                ),
                "UnresolvedPlaceholder",
            ));
        }

        if intent.confirmation_required() && !confirm.confirm(intent.method(), intent.path()) {
            info!("User declined {} {}", intent.method(), intent.path());
            return DispatchOutcome::Cancelled {
                method: intent.method(),
                path: intent.path().to_string(),
            };
        }

        let response = self
            .client
            .execute(intent.method(), intent.path(), request_options(intent))
            .await;
        DispatchOutcome::Executed(response)
    }
}

/// Leftover parameters: JSON body for POST/PUT/PATCH, query string otherwise
fn request_options(intent: &TradingIntent) -> RequestOptions {
    let mut options = RequestOptions::new();

    if intent.method().carries_body() {
        let body: Map<String, Value> = intent
            .request_parameters()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        if !body.is_empty() {
            options = options.json(Value::Object(body));
        }
    } else {
        for (key, value) in intent.request_parameters() {
            options = options.query(key, value);
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockTransport, gateway};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use trader_gateway::RawResponse;

    fn intent(method: HttpMethod, path: &str, params: &[(&str, &str)]) -> TradingIntent {
        let params: BTreeMap<String, String> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TradingIntent::new(method, path, params).unwrap()
    }

    fn silent_transport() -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_send().never();
        transport
    }

    #[tokio::test]
    async fn test_get_is_sent_without_confirmation() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| {
                r.url == "https://api.test/v1/instruments/SBER@MISX/bars"
                    && r.query == vec![("timeframe".to_string(), "TIME_FRAME_D".to_string())]
                    && r.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, r#"{"bars": []}"#)));

        let asked = AtomicU32::new(0);
        let confirm = |_: HttpMethod, _: &str| {
            asked.fetch_add(1, Ordering::SeqCst);
            false
        };

        let outcome = Dispatcher::new(gateway(transport))
            .dispatch(
                &intent(
                    HttpMethod::Get,
                    "/v1/instruments/{symbol}/bars",
                    &[("symbol", "SBER@MISX"), ("timeframe", "TIME_FRAME_D")],
                ),
                &confirm,
            )
            .await;

        assert_eq!(outcome, DispatchOutcome::Executed(ApiResponse::new(json!({"bars": []}))));
        assert_eq!(asked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_declined_post_is_cancelled_not_sent() {
        let outcome = Dispatcher::new(gateway(silent_transport()))
            .dispatch(
                &intent(HttpMethod::Post, "/v1/accounts/A1/orders", &[]),
                &AutoDecline,
            )
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Cancelled {
                method: HttpMethod::Post,
                path: "/v1/accounts/A1/orders".to_string(),
            }
        );
        let response = outcome.into_response();
        assert!(response.is_cancelled());
        assert!(!response.is_error());
    }

    #[tokio::test]
    async fn test_confirmed_post_sends_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| {
                r.method == HttpMethod::Post
                    && r.query.is_empty()
                    && r.body == Some(json!({"quantity": "10", "side": "SIDE_BUY", "symbol": "SBER@MISX"}))
            })
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, r#"{"order_id": "42"}"#)));

        let seen = std::sync::Mutex::new(Vec::new());
        let confirm = |method: HttpMethod, path: &str| {
            seen.lock().unwrap().push(format!("{method} {path}"));
            true
        };

        let outcome = Dispatcher::new(gateway(transport))
            .dispatch(
                &intent(
                    HttpMethod::Post,
                    "/v1/accounts/{account_id}/orders",
                    &[
                        ("account_id", "A1"),
                        ("symbol", "SBER@MISX"),
                        ("quantity", "10"),
                        ("side", "SIDE_BUY"),
                    ],
                ),
                &confirm,
            )
            .await;

        assert_eq!(outcome.into_response().as_value()["order_id"], "42");
        assert_eq!(*seen.lock().unwrap(), vec!["POST /v1/accounts/A1/orders"]);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| r.method == HttpMethod::Delete)
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, "")));

        let outcome = Dispatcher::new(gateway(transport))
            .dispatch(
                &intent(HttpMethod::Delete, "/v1/accounts/A1/orders/7", &[]),
                &AutoApprove,
            )
            .await;

        assert_eq!(outcome.into_response().as_value()["status"], "success");
    }

    #[tokio::test]
    async fn test_unresolved_placeholder_is_refused() {
        let outcome = Dispatcher::new(gateway(silent_transport()))
            .dispatch(
                &intent(
                    HttpMethod::Delete,
                    "/v1/accounts/{account_id}/orders/{order_id}",
                    &[],
                ),
                &AutoApprove,
            )
            .await;

        let response = outcome.into_response();
        assert_eq!(response.error_kind(), Some("UnresolvedPlaceholder"));
        assert!(response.error_message().unwrap().contains("account_id, order_id"));
    }

    #[tokio::test]
    async fn test_put_is_not_gated() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|r| r.method == HttpMethod::Put && r.body == Some(json!({"price": "101.5"})))
            .times(1)
            .returning(|_| Ok(RawResponse::new(200, "{}")));

        let outcome = Dispatcher::new(gateway(transport))
            .dispatch(
                &intent(HttpMethod::Put, "/v1/accounts/A1/orders/7", &[("price", "101.5")]),
                &AutoDecline,
            )
            .await;

        assert!(!outcome.is_cancelled());
    }
}
