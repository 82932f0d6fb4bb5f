//! Question to [`TradingIntent`] resolution
//!
//! [`IntentResolver::resolve`] asks the language model for a structured
//! intent and, when the call fails or the answer is unusable, falls back to
//! a deterministic extractor that always yields a valid intent.

use crate::error::{IntentError, Result};
use crate::parser::{self, ParsedRequest};
use crate::prompt::PromptBuilder;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument, warn};
use trader_core::{Example, HttpMethod, TradingIntent};
use trader_llm::{CompletionRequest, LLMProvider, Message, TokenUsage};

/// Default `TICKER@BOARD` pattern
pub const DEFAULT_SYMBOL_PATTERN: &str = r"\b[A-Z0-9]{1,12}@[A-Z0-9]{2,12}\b";
/// Symbol used when the question names none
pub const DEFAULT_SYMBOL: &str = "SBER@MISX";
/// Board appended to bare tickers
pub const DEFAULT_BOARD: &str = "MISX";

const QUOTE_TEMPLATE: &str = "/v1/instruments/{symbol}/quotes/latest";
const ORDERS_TEMPLATE: &str = "/v1/accounts/{account_id}/orders";
const ORDER_TEMPLATE: &str = "/v1/accounts/{account_id}/orders/{order_id}";

static METHOD_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(GET|POST|DELETE|PUT|PATCH)\b").expect("method pattern is valid")
});

static CANCEL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(отмен\w*|cancel\w*)\b").expect("cancel pattern is valid")
});

static BARE_TICKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,6}\b").expect("ticker pattern is valid"));

static ORDER_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:заявк|ордер|order)\w*?\s*(?:№|#|id|номер)?\s*:?\s*([A-Za-z0-9-]*\d[A-Za-z0-9-]*)",
    )
    .expect("order id pattern is valid")
});

static NUMERIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3,}\b").expect("numeric id pattern is valid"));

/// Upper-case words that look like tickers but are not
const NOT_TICKERS: &[&str] = &[
    "API", "ETF", "USD", "EUR", "RUB", "CNY", "ID", "REST", "JSON", "HTTP", "HTTPS", "URL", "OK",
];

/// Resolver settings
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Model identifier passed to the provider
    pub model: String,

    /// Completion length limit
    pub max_tokens: usize,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on few-shot examples embedded in a prompt
    pub max_examples: usize,

    /// Regex recognising a fully-qualified instrument symbol
    pub symbol_pattern: String,

    /// Symbol used when none is found
    pub default_symbol: String,

    /// Board appended to bare tickers
    pub default_board: String,

    /// Account substituted for `{account_id}`
    pub account_id: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            max_tokens: 200,
            temperature: 0.0,
            max_examples: 10,
            symbol_pattern: DEFAULT_SYMBOL_PATTERN.to_string(),
            default_symbol: DEFAULT_SYMBOL.to_string(),
            default_board: DEFAULT_BOARD.to_string(),
            account_id: None,
        }
    }
}

impl ResolverConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_symbol_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.symbol_pattern = pattern.into();
        self
    }

    pub fn with_default_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.default_symbol = symbol.into();
        self
    }

    pub fn with_max_examples(mut self, max_examples: usize) -> Self {
        self.max_examples = max_examples;
        self
    }
}

/// Structured answer requested from the model
///
/// `confirmationRequired` may be present but is ignored: the flag is
/// always derived from the method.
#[derive(Debug, serde::Deserialize)]
struct ModelIntent {
    method: String,
    path: String,
    #[serde(default)]
    parameters: serde_json::Map<String, Value>,
}

/// Turns free-text questions into trading intents
pub struct IntentResolver {
    provider: Arc<dyn LLMProvider>,
    config: ResolverConfig,
    prompts: PromptBuilder,
    symbol_pattern: Regex,
}

impl std::fmt::Debug for IntentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl IntentResolver {
    pub fn new(provider: Arc<dyn LLMProvider>, config: ResolverConfig) -> Result<Self> {
        let symbol_pattern = Regex::new(&config.symbol_pattern).map_err(|e| {
            IntentError::Config(format!("symbol pattern '{}': {e}", config.symbol_pattern))
        })?;

        Ok(Self {
            provider,
            config,
            prompts: PromptBuilder::new()?,
            symbol_pattern,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a question into an intent; never fails
    #[instrument(skip(self, examples), fields(examples = examples.len()))]
    pub async fn resolve(&self, question: &str, examples: &[Example]) -> TradingIntent {
        match self.resolve_with_model(question, examples).await {
            Ok(intent) => {
                debug!("Model resolved intent: {} {}", intent.method(), intent.path());
                intent
            }
            Err(e) => {
                warn!("Falling back to deterministic extraction: {}", e);
                self.fallback(question)
            }
        }
    }

    async fn resolve_with_model(&self, question: &str, examples: &[Example]) -> Result<TradingIntent> {
        let examples = &examples[..examples.len().min(self.config.max_examples)];
        let prompt =
            self.prompts
                .intent_prompt(question, examples, self.config.account_id.as_deref())?;

        let request = CompletionRequest::builder(&self.config.model)
            .add_message(Message::user(prompt))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .json_output()
            .build();

        let response = self.provider.complete(request).await?;
        self.intent_from_answer(response.text())
    }

    /// Interpret a structured model answer
    pub fn intent_from_answer(&self, answer: &str) -> Result<TradingIntent> {
        let object = parser::extract_json_object(answer)
            .ok_or_else(|| IntentError::UnusableAnswer("no JSON object".to_string()))?;
        let answer: ModelIntent = serde_json::from_value(Value::Object(object))
            .map_err(|e| IntentError::UnusableAnswer(e.to_string()))?;

        let method: HttpMethod = answer.method.parse()?;
        let mut parameters: BTreeMap<String, String> = answer
            .parameters
            .into_iter()
            .filter_map(|(key, value)| parameter_text(value).map(|text| (key, text)))
            .collect();
        self.add_account(&answer.path, &mut parameters);

        Ok(TradingIntent::new(method, &answer.path, parameters)?)
    }

    /// Deterministic extraction from the question text alone
    pub fn fallback(&self, question: &str) -> TradingIntent {
        let method = scan_method(question);
        let mut parameters = BTreeMap::new();

        let template = match method {
            HttpMethod::Get => QUOTE_TEMPLATE,
            HttpMethod::Delete => ORDER_TEMPLATE,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => ORDERS_TEMPLATE,
        };
        if method == HttpMethod::Delete {
            if let Some(order_id) = scan_order_id(question) {
                parameters.insert("order_id".to_string(), order_id);
            }
        } else {
            parameters.insert("symbol".to_string(), self.scan_symbol(question));
        }
        self.add_account(template, &mut parameters);

        debug!("Fallback intent: {} {}", method, template);
        TradingIntent::new(method, template, parameters).unwrap_or_default()
    }

    /// Ask the model for a flat `(method, path)` pair
    ///
    /// Unlike [`IntentResolver::resolve`] this surfaces model-call errors so
    /// batch callers can count them.
    pub async fn suggest_request(
        &self,
        question: &str,
        examples: &[Example],
    ) -> Result<(ParsedRequest, TokenUsage)> {
        let prompt = self.prompts.submission_prompt(question, examples)?;
        let request = CompletionRequest::builder(&self.config.model)
            .add_message(Message::user(prompt))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build();

        let response = self.provider.complete(request).await?;
        Ok((parser::parse(response.text()), response.usage))
    }

    fn scan_symbol(&self, question: &str) -> String {
        if let Some(found) = self.symbol_pattern.find(question) {
            return found.as_str().to_uppercase();
        }

        BARE_TICKER
            .find_iter(question)
            .map(|m| m.as_str())
            .find(|ticker| ticker.parse::<HttpMethod>().is_err() && !NOT_TICKERS.contains(ticker))
            .map_or_else(
                || self.config.default_symbol.clone(),
                |ticker| format!("{ticker}@{}", self.config.default_board),
            )
    }

    fn add_account(&self, path: &str, parameters: &mut BTreeMap<String, String>) {
        if let Some(account_id) = &self.config.account_id {
            if trader_core::placeholders(path).contains(&"account_id") {
                parameters
                    .entry("account_id".to_string())
                    .or_insert_with(|| account_id.clone());
            }
        }
    }
}

fn scan_method(question: &str) -> HttpMethod {
    let named = METHOD_WORD
        .captures(question)
        .and_then(|caps| caps[1].parse().ok());

    match named {
        Some(method) => method,
        None if CANCEL_WORD.is_match(question) => HttpMethod::Delete,
        None => HttpMethod::default(),
    }
}

/// Order id named after an order noun, else the first run of three or more digits
fn scan_order_id(question: &str) -> Option<String> {
    ORDER_ID
        .captures(question)
        .map(|caps| caps[1].to_string())
        .or_else(|| NUMERIC_ID.find(question).map(|m| m.as_str().to_string()))
}

fn parameter_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
