//! Core domain types for the trading assistant
//!
//! This crate holds the small set of types shared by the intent resolver,
//! the API gateway client and the command-line front end:
//!
//! - [`HttpMethod`] - the verbs the brokerage API understands
//! - [`TradingIntent`] - a validated `(method, path, parameters)` triple
//! - [`Example`] - a labeled few-shot training record
//! - [`CoreError`] - validation failures when building the above

pub mod error;
pub mod example;
pub mod intent;
pub mod method;

pub use error::{CoreError, Result};
pub use example::Example;
pub use intent::{TradingIntent, fill_placeholders, placeholders};
pub use method::HttpMethod;

/// Every brokerage endpoint lives under this prefix
pub const API_PREFIX: &str = "/v1/";
