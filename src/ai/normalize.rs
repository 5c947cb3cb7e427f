//! Turns a raw endpoint reply into a [`NormalizedResult`].
//!
//! The endpoint is inconsistent about how it wraps its payload: sometimes a
//! plain JSON value, sometimes an object with a `"response"` envelope, and
//! sometimes JSON that was encoded a second time as a string. Each step of
//! the unwrap is its own function:
//!
//! ```text
//! status != 200          -> Http { code, details }
//! body not JSON          -> JsonDecode("invalid JSON response")
//! body is a JSON string  -> parse it again, or JsonDecode("invalid JSON nested as text")
//! object with "response" -> the envelope value (JSON text inside it is parsed)
//! anything else          -> the parsed value unchanged
//! ```

use super::types::RawResponse;
use crate::models::{ErrorRecord, NormalizedResult};
use serde_json::Value;

pub const ENVELOPE_KEY: &str = "response";

pub fn normalize(response: &RawResponse) -> NormalizedResult {
    if let Some(record) = check_status(response) {
        return NormalizedResult::Error(record);
    }

    match parse_outer(&response.body) {
        Ok(Value::String(text)) => decode_nested(&text),
        Ok(value) => unwrap_envelope(value),
        Err(record) => NormalizedResult::Error(record),
    }
}

fn check_status(response: &RawResponse) -> Option<ErrorRecord> {
    if response.status == 200 {
        return None;
    }

    tracing::warn!(
        "Inference endpoint returned status {}: {}",
        response.status,
        response.body
    );
    Some(ErrorRecord::Http {
        code: response.status,
        details: response.body.clone(),
    })
}

fn parse_outer(body: &str) -> Result<Value, ErrorRecord> {
    serde_json::from_str(body).map_err(|e| {
        tracing::warn!("Response body is not JSON: {}", e);
        ErrorRecord::invalid_json()
    })
}

fn decode_nested(text: &str) -> NormalizedResult {
    match serde_json::from_str(text) {
        Ok(value) => NormalizedResult::Json(value),
        Err(e) => {
            tracing::warn!("Nested JSON text failed to parse: {}", e);
            NormalizedResult::Error(ErrorRecord::invalid_nested_json())
        }
    }
}

fn unwrap_envelope(value: Value) -> NormalizedResult {
    match value {
        Value::Object(mut map) => match map.remove(ENVELOPE_KEY) {
            Some(Value::String(text)) => NormalizedResult::Json(decode_envelope_text(text)),
            Some(inner) => NormalizedResult::Json(inner),
            None => NormalizedResult::Json(Value::Object(map)),
        },
        other => NormalizedResult::Json(other),
    }
}

/// Model text that is not JSON is handed back as a plain string.
fn decode_envelope_text(text: String) -> Value {
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!("Envelope text is not JSON, keeping it as a string");
            Value::String(text)
        }
    }
}
