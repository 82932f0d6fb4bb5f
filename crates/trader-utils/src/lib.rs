//! Shared utilities for the trading assistant
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and environment-based settings.

pub mod config;
pub mod logging;

pub use config::{ConfigError, Settings};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
