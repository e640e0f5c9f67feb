use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Absolute-URL check; relative references fail to parse.
pub(crate) fn is_valid_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// Per-field validation messages, serialized as
/// `{"fieldErrors": {field: [messages]}}` inside the error body.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_error(self) -> ApiError {
        ApiError::Validation(json!({ "fieldErrors": self.fields }))
    }
}

/// Pulls a required string field out of a JSON object, recording a field
/// error when it is missing or not a string.
pub(crate) fn require_string(
    obj: &Map<String, Value>,
    field: &'static str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => {
            errors.push(field, "Required");
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(field, "Expected string");
            None
        }
    }
}

pub(crate) fn as_object<'a>(body: &'a Value) -> Result<&'a Map<String, Value>, ApiError> {
    body.as_object()
        .ok_or_else(|| ApiError::validation("Expected a JSON object"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("user.name+tag@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn url_validation() {
        assert!(is_valid_url("https://example.com/path?q=1"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("/relative/path"));
    }

    #[test]
    fn field_errors_serialize_per_field() {
        let mut errors = FieldErrors::default();
        errors.push("newPassword", "Password must be at least 8 characters");
        errors.push("confirmPassword", "Passwords don't match");
        let err = errors.into_error();
        let ApiError::Validation(detail) = err else {
            panic!("expected validation error");
        };
        assert!(detail["fieldErrors"]["newPassword"][0]
            .as_str()
            .unwrap()
            .contains("at least 8 characters"));
        assert!(detail["fieldErrors"]["confirmPassword"][0]
            .as_str()
            .unwrap()
            .contains("don't match"));
    }

    #[test]
    fn require_string_flags_missing_and_wrong_type() {
        let obj = serde_json::json!({ "currentPassword": 123 });
        let obj = obj.as_object().unwrap();
        let mut errors = FieldErrors::default();
        assert!(require_string(obj, "currentPassword", &mut errors).is_none());
        assert!(require_string(obj, "newPassword", &mut errors).is_none());
        assert!(!errors.is_empty());
    }
}
