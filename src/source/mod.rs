//! Card pool sources.
//!
//! A source turns a source key into a parsed card pool. The session never
//! talks to the network or filesystem directly; it goes through `CardSource`.

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use crate::error::LoadError;
use crate::model::Card;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait CardSource: Send + Sync {
    /// Fetch and decode the pool named by `key`.
    async fn fetch(&self, key: &str) -> Result<Vec<Card>, LoadError>;
}

/// Decode a payload that must be a JSON array of cards.
///
/// Only the top-level shape is strict. An element that is not an object
/// becomes an empty card so pool positions match the source array.
pub fn parse_pool(bytes: &[u8]) -> Result<Vec<Card>, LoadError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| LoadError::Malformed(e.to_string()))?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(LoadError::Malformed(format!(
                "expected a JSON array of cards, got {}",
                json_kind(&other)
            )));
        }
    };
    Ok(items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            Value::Object(_) => serde_json::from_value(item).unwrap_or_else(|e| {
                tracing::debug!(position, error = %e, "unreadable card, using placeholder");
                Card::default()
            }),
            other => {
                tracing::debug!(position, kind = json_kind(&other), "non-object card, using placeholder");
                Card::default()
            }
        })
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Object(_) => "an object",
        Value::Array(_) => "an array",
    }
}

/// Fetch with an upper bound so a hung request cannot leave a session loading forever.
pub async fn fetch_with_timeout(
    source: &dyn CardSource,
    key: &str,
    timeout: Duration,
) -> Result<Vec<Card>, LoadError> {
    match tokio::time::timeout(timeout, source.fetch(key)).await {
        Ok(res) => res,
        Err(_) => Err(LoadError::Timeout(timeout)),
    }
}

fn validate_key(key: &str) -> Result<&str, LoadError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(LoadError::InvalidKey(key.to_string()));
    }
    Ok(trimmed.strip_prefix("./").unwrap_or(trimmed))
}
