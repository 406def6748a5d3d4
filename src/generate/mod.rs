//! The inference-backed operations behind `/api/*`.
//!
//! Every operation validates its required fields, makes at most one completion call,
//! and recovers structure with [`crate::extract`]. Hard failures come back as
//! [`ApiError`]; operations with a fallback never fail once their input is valid.

pub mod course;
pub mod feedback;
pub mod recommendations;
pub mod roadmap;
pub mod tutor;
pub mod validation;

use serde_json::Value;

use crate::error::ApiError;

/// A present, non-blank string field.
pub(crate) fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingField(field))
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Pulls the list stored under `key`, or the value itself when the model returned a bare array.
pub(crate) fn list_under(value: Value, key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_rejects_blank_and_absent() {
        assert_eq!(required(&Some(" Rust ".into()), "title").unwrap(), "Rust");
        assert!(matches!(required(&Some("  ".into()), "title"), Err(ApiError::MissingField("title"))));
        assert!(matches!(required(&None, "duration"), Err(ApiError::MissingField("duration"))));
    }

    #[test]
    fn list_under_accepts_wrapped_and_bare_lists() {
        assert_eq!(list_under(json!({"projects": [1, 2]}), "projects").len(), 2);
        assert_eq!(list_under(json!([1]), "projects").len(), 1);
        assert!(list_under(json!({"other": [1]}), "projects").is_empty());
        assert!(list_under(json!("text"), "projects").is_empty());
    }
}
