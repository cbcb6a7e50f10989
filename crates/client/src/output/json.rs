//! JSON output formatting.

use serde::Serialize;

/// Format a value as compact JSON.
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(&e))
}

/// Format a value as indented JSON.
pub fn format_json_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| error_json(&e))
}

fn error_json(err: &serde_json::Error) -> String {
    serde_json::json!({ "error": err.to_string() }).to_string()
}
