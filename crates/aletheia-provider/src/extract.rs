//! JSON payload extraction from model output
//!
//! Models wrap JSON in prose or Markdown fences despite instructions.
//! The widest `{ ... }` span wins; fences are stripped only when no braces
//! are found at all.

use aletheia_core::ProviderError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static OBJECT_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("object span pattern is valid"));

/// Pull the assistant text out of a chat completions envelope
///
/// # Errors
/// - `ProviderError::EmptyResponse` when there is no non-blank content
pub fn completion_content(envelope: &Value) -> Result<&str, ProviderError> {
    envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ProviderError::EmptyResponse)
}

/// Parse the JSON object embedded in `text`
///
/// # Errors
/// - `ProviderError::UnparseableBody` when no JSON object can be read
pub fn extract_json_object(text: &str) -> Result<Value, ProviderError> {
    let text = text.trim();
    let candidate = match OBJECT_SPAN.find(text) {
        Some(m) => m.as_str().to_string(),
        None => text.replace("```json", "").replace("```", "").trim().to_string(),
    };

    let value: Value = serde_json::from_str(&candidate)
        .map_err(|e| ProviderError::UnparseableBody(e.to_string()))?;
    if !value.is_object() {
        return Err(ProviderError::UnparseableBody(
            "payload is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}
