//! Mocks shared by this crate's unit tests

use async_trait::async_trait;
use mockall::mock;
use std::sync::Arc;
use trader_gateway::{
    ApiRequest, GatewayClient, GatewayConfig, RawResponse, RetryPolicy, SystemClock, Transport,
};
use trader_llm::{
    CompletionRequest, CompletionResponse, LLMProvider, Message, StopReason, TokenUsage,
};

mock! {
    pub Provider {}

    #[async_trait]
    impl LLMProvider for Provider {
        async fn complete(&self, request: CompletionRequest) -> trader_llm::Result<CompletionResponse>;
        fn name(&self) -> &str;
    }
}

mock! {
    pub Transport {}

    #[async_trait]
    impl Transport for Transport {
        async fn send(&self, request: &ApiRequest) -> trader_gateway::Result<RawResponse>;
    }
}

/// Completion carrying `text` and no usage
pub fn completion(text: &str) -> CompletionResponse {
    CompletionResponse {
        message: Message::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage::default(),
    }
}

/// Gateway client over a mock transport, single attempt per call
pub fn gateway(transport: MockTransport) -> Arc<GatewayClient> {
    let config = GatewayConfig::builder()
        .base_url("https://api.test")
        .access_token("tok")
        .retry(RetryPolicy::no_retry())
        .build()
        .expect("test config is valid");

    Arc::new(GatewayClient::with_transport(
        config,
        Arc::new(transport),
        Arc::new(SystemClock),
    ))
}
