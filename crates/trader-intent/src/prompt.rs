//! Prompt templates for the language model
//!
//! Both prompts embed the brokerage endpoint catalog and a handful of
//! few-shot examples. The intent prompt asks for a structured
//! `{method, path, parameters, confirmationRequired}` object; the
//! submission prompt asks for the flat `{"type", "request"}` pair used by
//! batch evaluation.

use crate::error::{IntentError, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use trader_core::{Example, HttpMethod};
use trader_gateway::TIMEFRAMES;

const PREAMBLE_TEMPLATE_NAME: &str = "preamble";
const INTENT_TEMPLATE_NAME: &str = "intent";
const SUBMISSION_TEMPLATE_NAME: &str = "submission";

const PREAMBLE: &str = r#"Ты - эксперт по Finam TradeAPI. Твоя задача - преобразовать вопрос на русском языке в HTTP запрос к API.

API Documentation:
{% for endpoint in endpoints -%}
- {{ endpoint.method }} {{ endpoint.path }} - {{ endpoint.description }}
{% endfor %}
Timeframes: {{ timeframes | join(", ") }}
"#;

const INTENT_BODY: &str = r#"{% include "preamble" %}

Правила:
- path всегда начинается с /v1/
- значения для {placeholder} в пути передавай в parameters
- POST и DELETE требуют подтверждения пользователя
{%- if account_id %}
- номер счета пользователя: {{ account_id }}
{%- endif %}

Примеры:
{% for ex in examples %}
Вопрос: "{{ ex.question }}"
Ответ: {"method": "{{ ex["type"] }}", "path": "{{ ex.request }}", "parameters": {}}
{% endfor %}
Вопрос: "{{ question }}"
Ответ строго одним JSON объектом: {"method": "HTTP_METHOD", "path": "/v1/...", "parameters": {"name": "value"}, "confirmationRequired": true|false}"#;

const SUBMISSION_BODY: &str = r#"{% include "preamble" %}

Примеры:
{% for ex in examples %}
Вопрос: "{{ ex.question }}"
Ответ: {"type": "{{ ex["type"] }}", "request": "{{ ex.request }}"}
{% endfor %}
Вопрос: "{{ question }}"
Ответ в формате JSON: {"type": "HTTP_METHOD", "request": "/path/to/endpoint"}"#;

/// One documented brokerage endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiEndpoint {
    pub method: HttpMethod,
    pub path: &'static str,
    pub description: &'static str,
}

const fn endpoint(method: HttpMethod, path: &'static str, description: &'static str) -> ApiEndpoint {
    ApiEndpoint {
        method,
        path,
        description,
    }
}

/// Endpoint catalog shown to the model
pub const API_ENDPOINTS: &[ApiEndpoint] = &[
    endpoint(HttpMethod::Get, "/v1/exchanges", "список бирж"),
    endpoint(HttpMethod::Get, "/v1/assets", "поиск инструментов"),
    endpoint(HttpMethod::Get, "/v1/assets/{symbol}", "информация об инструменте"),
    endpoint(HttpMethod::Get, "/v1/assets/{symbol}/params", "параметры инструмента для счета"),
    endpoint(HttpMethod::Get, "/v1/assets/{symbol}/schedule", "расписание торгов"),
    endpoint(HttpMethod::Get, "/v1/assets/{symbol}/options", "опционы на базовый актив"),
    endpoint(HttpMethod::Get, "/v1/instruments/{symbol}/quotes/latest", "последняя котировка"),
    endpoint(HttpMethod::Get, "/v1/instruments/{symbol}/orderbook", "биржевой стакан"),
    endpoint(HttpMethod::Get, "/v1/instruments/{symbol}/trades/latest", "лента сделок"),
    endpoint(
        HttpMethod::Get,
        "/v1/instruments/{symbol}/bars",
        "исторические свечи (параметры: timeframe, interval.start_time, interval.end_time)",
    ),
    endpoint(HttpMethod::Get, "/v1/accounts/{account_id}", "информация о счете"),
    endpoint(HttpMethod::Get, "/v1/accounts/{account_id}/orders", "список ордеров"),
    endpoint(
        HttpMethod::Get,
        "/v1/accounts/{account_id}/orders/{order_id}",
        "информация об ордере",
    ),
    endpoint(HttpMethod::Get, "/v1/accounts/{account_id}/trades", "история сделок"),
    endpoint(
        HttpMethod::Get,
        "/v1/accounts/{account_id}/transactions",
        "транзакции по счету",
    ),
    endpoint(HttpMethod::Post, "/v1/sessions", "создание новой сессии"),
    endpoint(HttpMethod::Post, "/v1/sessions/details", "детали текущей сессии"),
    endpoint(HttpMethod::Post, "/v1/accounts/{account_id}/orders", "создание ордера"),
    endpoint(
        HttpMethod::Delete,
        "/v1/accounts/{account_id}/orders/{order_id}",
        "отмена ордера",
    ),
];

/// Renders the resolver's prompts
#[derive(Debug)]
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();

        for (name, source) in [
            (PREAMBLE_TEMPLATE_NAME, PREAMBLE),
            (INTENT_TEMPLATE_NAME, INTENT_BODY),
            (SUBMISSION_TEMPLATE_NAME, SUBMISSION_BODY),
        ] {
            env.add_template(name, source)
                .map_err(|e| template_error(name, &e))?;
        }

        Ok(Self { env })
    }

    /// Prompt asking for a structured intent object
    pub fn intent_prompt(
        &self,
        question: &str,
        examples: &[Example],
        account_id: Option<&str>,
    ) -> Result<String> {
        self.render(
            INTENT_TEMPLATE_NAME,
            context! {
                endpoints => API_ENDPOINTS,
                timeframes => TIMEFRAMES,
                examples => examples,
                question => question,
                account_id => account_id,
            },
        )
    }

    /// Prompt asking for a `{"type", "request"}` pair
    pub fn submission_prompt(&self, question: &str, examples: &[Example]) -> Result<String> {
        self.render(
            SUBMISSION_TEMPLATE_NAME,
            context! {
                endpoints => API_ENDPOINTS,
                timeframes => TIMEFRAMES,
                examples => examples,
                question => question,
            },
        )
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|e| template_error(name, &e))
    }
}

fn template_error(name: &str, error: &minijinja::Error) -> IntentError {
    IntentError::Template {
        name: name.to_string(),
        detail: error.to_string(),
    }
}
