use serde_json::Value;

use crate::error::ApiError;
use crate::validate::{as_object, is_valid_url, FieldErrors};

/// The only fields a partial update may touch, in the order they are
/// emitted. Column names come exclusively from this table; nothing in a
/// client payload ever reaches the statement text.
const COLUMNS: &[(&str, &str)] = &[
    ("url", "url"),
    ("archived", "archived"),
    ("favorited", "favorited"),
];

/// Validated partial update. Unknown payload keys are dropped at parse
/// time; a known key with the wrong type rejects the whole request.
#[derive(Debug, Default, PartialEq)]
pub struct ArticleUpdate {
    pub url: Option<String>,
    pub archived: Option<bool>,
    pub favorited: Option<bool>,
}

impl ArticleUpdate {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let obj = as_object(body)?;
        let mut errors = FieldErrors::default();
        let mut update = Self::default();

        if let Some(raw) = obj.get("url") {
            match raw.as_str() {
                Some(s) if is_valid_url(s) => update.url = Some(s.to_string()),
                Some(_) => errors.push("url", "Invalid url"),
                None => errors.push("url", "Expected string"),
            }
        }
        if let Some(raw) = obj.get("archived") {
            match raw.as_bool() {
                Some(b) => update.archived = Some(b),
                None => errors.push("archived", "Expected boolean"),
            }
        }
        if let Some(raw) = obj.get("favorited") {
            match raw.as_bool() {
                Some(b) => update.favorited = Some(b),
                None => errors.push("favorited", "Expected boolean"),
            }
        }

        if !errors.is_empty() {
            return Err(errors.into_error());
        }
        Ok(update)
    }
}

/// A value bound into the update statement; never interpolated.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// Builds the parameterized update statement for one owned row. The target
/// is always constrained by both article id and owner id; the caller binds
/// those two after the field params.
pub fn build_update(update: &ArticleUpdate) -> Result<(String, Vec<SqlParam>), ApiError> {
    let mut sets = Vec::new();
    let mut params = Vec::new();

    for (field, column) in COLUMNS {
        let value = match *field {
            "url" => update.url.as_ref().map(|u| SqlParam::Text(u.clone())),
            // Booleans are stored as 0/1.
            "archived" => update.archived.map(|b| SqlParam::Int(i64::from(b))),
            "favorited" => update.favorited.map(|b| SqlParam::Int(i64::from(b))),
            _ => None,
        };
        if let Some(value) = value {
            sets.push(format!("{column} = ?"));
            params.push(value);
        }
    }

    if sets.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let sql = format!(
        "UPDATE articles SET {}, updated_at = datetime('now') WHERE id = ? AND user_id = ?",
        sets.join(", ")
    );
    Ok((sql, params))
}
