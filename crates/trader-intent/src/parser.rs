//! Lenient parsing of model answers into `(method, path)` pairs
//!
//! [`parse`] never fails. It tries, in order:
//!
//! 1. the whole answer as a JSON object with `type` and `request` fields
//!    (a surrounding code fence is tolerated)
//! 2. a `{...}` span inside prose, if it carries `type` or `request`
//! 3. an HTTP verb directly followed by a `/`-prefixed path
//! 4. any `/`-prefixed token
//!
//! A request body written after the path (`POST /v1/... {"quantity": 1}`)
//! is not mistaken for the answer object.
//!
//! The method defaults to `GET` and any path outside `/v1/` is replaced by
//! [`DEFAULT_PATH`].

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::LazyLock;
use trader_core::{API_PREFIX, HttpMethod};

/// Path used whenever extraction yields nothing usable
pub const DEFAULT_PATH: &str = "/v1/assets";

static METHOD_AND_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(GET|POST|DELETE|PUT|PATCH)\s*(/\S*)").expect("method/path pattern is valid")
});

static ANY_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\S+").expect("path pattern is valid"));

const TRAILING_JUNK: &[char] = &['"', '\'', '`', '.', ',', ';', ':', '!', '?', ')', ']', '>'];

/// Method and path extracted from free text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRequest {
    #[serde(rename = "type")]
    pub method: HttpMethod,
    #[serde(rename = "request")]
    pub path: String,
}

impl ParsedRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl Default for ParsedRequest {
    fn default() -> Self {
        Self::new(HttpMethod::Get, DEFAULT_PATH)
    }
}

impl fmt::Display for ParsedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Extract a `(method, path)` pair from a model answer
pub fn parse(text: &str) -> ParsedRequest {
    let text = strip_code_fence(text);

    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
        return from_object(&object);
    }

    let answer_object = embedded_object(text)
        .filter(|object| object.contains_key("type") || object.contains_key("request"));
    if let Some(object) = answer_object {
        return from_object(&object);
    }

    if let Some(caps) = METHOD_AND_PATH.captures(text) {
        let method = caps[1].parse().unwrap_or_default();
        return ParsedRequest::new(method, guard_path(&caps[2]));
    }

    let path = ANY_PATH.find(text).map_or("", |m| m.as_str());
    ParsedRequest::new(HttpMethod::Get, guard_path(path))
}

/// Remove a surrounding Markdown code fence, with or without a language tag
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// The JSON object in `text`: either the whole text or its outermost `{...}` span
pub fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let text = strip_code_fence(text);

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(_) => embedded_object(text),
    }
}

fn embedded_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn from_object(object: &serde_json::Map<String, Value>) -> ParsedRequest {
    let method = object
        .get("type")
        .and_then(Value::as_str)
        .and_then(|m| m.parse().ok())
        .unwrap_or_default();
    let path = object
        .get("request")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PATH);

    ParsedRequest::new(method, guard_path(path))
}

/// Trim trailing punctuation and force the path under `/v1/`
fn guard_path(raw: &str) -> String {
    let mut cleaned = raw.trim();
    loop {
        let unbalanced_brace =
            cleaned.ends_with('}') && cleaned.matches('}').count() > cleaned.matches('{').count();
        if cleaned.ends_with(TRAILING_JUNK) || unbalanced_brace {
            cleaned = &cleaned[..cleaned.len() - 1];
        } else {
            break;
        }
    }

    if cleaned.starts_with(API_PREFIX) {
        cleaned.to_string()
    } else {
        DEFAULT_PATH.to_string()
    }
}
