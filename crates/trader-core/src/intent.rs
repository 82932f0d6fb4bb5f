//! Resolved trading intents
//!
//! A [`TradingIntent`] is the validated outcome of turning a free-text
//! question into a brokerage call. It is built once per question, never
//! mutated, and consumed by the dispatcher.

use crate::{API_PREFIX, CoreError, HttpMethod, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A validated `(method, path, parameters)` triple
///
/// Construct with [`TradingIntent::new`], which substitutes `{placeholder}`
/// tokens from `parameters`, enforces the `/v1/` prefix and derives
/// `confirmation_required` from the method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingIntent {
    method: HttpMethod,
    path: String,
    parameters: BTreeMap<String, String>,
    confirmation_required: bool,
    #[serde(skip)]
    path_parameters: BTreeSet<String>,
}

impl TradingIntent {
    /// Build an intent from a path template and its parameters
    ///
    /// Every `{name}` in `path` with a matching entry in `parameters` is
    /// replaced by that entry. Unmatched placeholders stay in the path and
    /// are reported by [`TradingIntent::unresolved_placeholders`].
    pub fn new(
        method: HttpMethod,
        path: impl AsRef<str>,
        parameters: BTreeMap<String, String>,
    ) -> Result<Self> {
        let (path, used) = fill_placeholders(path.as_ref().trim(), &parameters);

        if !path.starts_with(API_PREFIX) {
            return Err(CoreError::InvalidPath(path));
        }

        Ok(Self {
            method,
            path,
            parameters,
            confirmation_required: method.requires_confirmation(),
            path_parameters: used,
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// All extracted parameters, including those substituted into the path
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn confirmation_required(&self) -> bool {
        self.confirmation_required
    }

    /// Parameters that were not consumed by path placeholders
    ///
    /// These travel as query parameters or as the JSON body, depending on
    /// the method.
    pub fn request_parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters
            .iter()
            .filter(|(k, _)| !self.path_parameters.contains(k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Placeholder names still present in the path
    pub fn unresolved_placeholders(&self) -> Vec<&str> {
        placeholders(&self.path)
    }
}

impl Default for TradingIntent {
    /// `GET /v1/assets`, the safe catch-all request
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            path: format!("{API_PREFIX}assets"),
            parameters: BTreeMap::new(),
            confirmation_required: false,
            path_parameters: BTreeSet::new(),
        }
    }
}

/// Names of all `{placeholder}` tokens in `path`, in order of appearance
pub fn placeholders(path: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let name = &after[..close];
        if is_placeholder_name(name) {
            names.push(name);
        }
        rest = &after[close + 1..];
    }

    names
}

/// Substitute `{name}` tokens with values from `parameters`
///
/// Returns the filled path and the set of parameter names that were used.
pub fn fill_placeholders(
    path: &str,
    parameters: &BTreeMap<String, String>,
) -> (String, BTreeSet<String>) {
    let mut filled = String::with_capacity(path.len());
    let mut used = BTreeSet::new();
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        filled.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            filled.push_str(&rest[open..]);
            return (filled, used);
        };

        let name = &after[..close];
        match parameters.get(name) {
            Some(value) if is_placeholder_name(name) && !value.is_empty() => {
                filled.push_str(value);
                used.insert(name.to_string());
            }
            _ => {
                filled.push('{');
                filled.push_str(name);
                filled.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    filled.push_str(rest);
    (filled, used)
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
