//! Brokerage REST gateway client
//!
//! [`GatewayClient::execute`] sends one request to the brokerage API and
//! always comes back with an [`ApiResponse`]: either the decoded payload or
//! one of a small set of structured error shapes. Around that call sit
//!
//! - credential refresh: an expired session token is renewed through
//!   `POST /v1/sessions` before the request goes out
//! - retry: transport failures and HTTP 500/503 are retried with capped
//!   exponential backoff ([`RetryPolicy`])
//! - an endpoint catalog of convenience wrappers (quotes, order book, bars,
//!   accounts, orders, trades, sessions)
//!
//! The HTTP layer sits behind the [`Transport`] trait so the policy code
//! can be exercised without a network.

pub mod client;
pub mod config;
pub mod credential;
pub mod endpoints;
pub mod error;
pub mod response;
pub mod retry;
pub mod transport;

pub use client::{GatewayClient, RequestOptions};
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use credential::{Clock, Credential, CredentialStore, ManualClock, SystemClock};
pub use endpoints::{DEFAULT_ORDERBOOK_DEPTH, DEFAULT_TIMEFRAME, TIMEFRAMES};
pub use error::{GatewayError, Result};
pub use response::ApiResponse;
pub use retry::RetryPolicy;
pub use transport::{ApiRequest, RawResponse, ReqwestTransport, Transport};
