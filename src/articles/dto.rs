use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::validate::{as_object, is_valid_url, FieldErrors};

/// Request body for article creation.
#[derive(Debug)]
pub struct CreateArticleRequest {
    pub url: String,
    pub archived: bool,
    pub favorited: bool,
}

impl CreateArticleRequest {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let obj = as_object(body)?;
        let mut errors = FieldErrors::default();

        let url = match obj.get("url") {
            Some(Value::String(s)) if is_valid_url(s) => Some(s.clone()),
            Some(Value::String(_)) => {
                errors.push("url", "Invalid url");
                None
            }
            Some(_) => {
                errors.push("url", "Expected string");
                None
            }
            None => {
                errors.push("url", "Required");
                None
            }
        };

        let mut optional_flag = |field: &'static str| match obj.get(field) {
            None => Some(false),
            Some(raw) => match raw.as_bool() {
                Some(b) => Some(b),
                None => {
                    errors.push(field, "Expected boolean");
                    None
                }
            },
        };
        let archived = optional_flag("archived");
        let favorited = optional_flag("favorited");

        match (url, archived, favorited) {
            (Some(url), Some(archived), Some(favorited)) if errors.is_empty() => Ok(Self {
                url,
                archived,
                favorited,
            }),
            _ => Err(errors.into_error()),
        }
    }
}

/// Optional list filters taken from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    pub archived: Option<bool>,
    pub favorited: Option<bool>,
}
