//! Pulling structured fields out of free-form model output.
//!
//! Model replies are supposed to be JSON but routinely arrive wrapped in prose
//! or code fences, truncated, or as a bare diagram. Every lookup runs the
//! ordered [`ExtractionStrategy::CHAIN`] and takes the first hit.
//!
//! Two flavours exist:
//!
//! - lenient ([`extract_field`], [`extract_content`]): never fails, returns an
//!   empty string when nothing is found
//! - strict ([`extract_field_strict`], [`extract_list`], [`extract_object`]):
//!   returns an [`ExtractionError`] so the caller can pick a default

pub mod markup;
pub mod strategy;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use markup::clean_content;
pub use strategy::ExtractionStrategy;

/// Field whose string values are passed through [`clean_content`].
pub const CONTENT_FIELD: &str = "content";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("no JSON payload found in model output")]
    NoPayload,

    #[error("field '{field}' missing from model output")]
    MissingField { field: String },

    #[error("field '{field}' has the wrong shape: expected {expected}")]
    WrongShape {
        field: String,
        expected: &'static str,
    },

    #[error("failed to decode model output: {0}")]
    Decode(String),
}

/// Run the strategy chain, returning the value and the strategy that found it.
fn locate(raw: &str, field: &str) -> Option<(ExtractionStrategy, Value)> {
    let found = ExtractionStrategy::CHAIN
        .iter()
        .find_map(|strategy| strategy.attempt(raw, field).map(|v| (*strategy, v)));

    if let Some((strategy, _)) = &found {
        tracing::trace!(field, strategy = strategy.name(), "extracted field");
    }
    found
}

fn render(strategy: ExtractionStrategy, field: &str, value: Value) -> String {
    match value {
        Value::String(s) if field == CONTENT_FIELD && strategy != ExtractionStrategy::MarkerSniff => {
            clean_content(&s)
        }
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn missing(raw: &str, field: &str) -> ExtractionError {
    if strategy::parse_object(raw).is_some() || strategy::embedded_object(raw).is_some() {
        ExtractionError::MissingField {
            field: field.to_string(),
        }
    } else {
        ExtractionError::NoPayload
    }
}

/// Best-effort lookup of `field`; empty string when nothing is found.
///
/// String values are returned as-is (cleaned to HTML for `content`); any
/// other JSON value comes back as compact JSON text.
pub fn extract_field(raw: &str, field: &str) -> String {
    locate(raw, field)
        .map(|(strategy, value)| render(strategy, field, value))
        .unwrap_or_default()
}

/// Like [`extract_field`] but reports why nothing was found.
pub fn extract_field_strict(raw: &str, field: &str) -> Result<String, ExtractionError> {
    match locate(raw, field) {
        Some((strategy, value)) => Ok(render(strategy, field, value)),
        None => Err(missing(raw, field)),
    }
}

/// Lenient `content` lookup, cleaned to display-safe HTML.
pub fn extract_content(raw: &str) -> String {
    extract_field(raw, CONTENT_FIELD)
}

/// Strict lookup of a list-of-strings field such as `cultural_refs`.
///
/// Numbers and booleans inside the list are accepted and rendered as text,
/// since models often answer `"grade_levels": [3, 4]`.
pub fn extract_list(raw: &str, field: &str) -> Result<Vec<String>, ExtractionError> {
    let wrong_shape = || ExtractionError::WrongShape {
        field: field.to_string(),
        expected: "array of strings",
    };

    let (_, value) = locate(raw, field).ok_or_else(|| missing(raw, field))?;
    let Value::Array(items) = value else {
        return Err(wrong_shape());
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.trim().to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(wrong_shape()),
        })
        .collect()
}

/// Decode the whole JSON object in `raw` into `T`.
pub fn extract_object<T: DeserializeOwned>(raw: &str) -> Result<T, ExtractionError> {
    let object = strategy::parse_object(raw)
        .or_else(|| strategy::embedded_object(raw))
        .ok_or(ExtractionError::NoPayload)?;

    serde_json::from_value(Value::Object(object)).map_err(|e| ExtractionError::Decode(e.to_string()))
}
