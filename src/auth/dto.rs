use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::validate::{as_object, is_valid_email, require_string, FieldErrors};

/// Request body for signup and login.
#[derive(Debug)]
pub struct CredsRequest {
    pub email: String,
    pub password: String,
}

impl CredsRequest {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let obj = as_object(body)?;
        let mut errors = FieldErrors::default();

        let email = require_string(obj, "email", &mut errors);
        let password = require_string(obj, "password", &mut errors);

        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.push("email", "Invalid email");
            }
        }
        if let Some(password) = &password {
            if password.len() < 8 {
                errors.push("password", "Password must be at least 8 characters");
            } else if password.len() > 128 {
                errors.push("password", "Password must be at most 128 characters");
            }
        }

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(Self { email, password }),
            _ => Err(errors.into_error()),
        }
    }
}

/// Request body for token refresh.
#[derive(Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl RefreshRequest {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let obj = as_object(body)?;
        let mut errors = FieldErrors::default();
        match require_string(obj, "refreshToken", &mut errors) {
            Some(refresh_token) if !refresh_token.is_empty() => Ok(Self { refresh_token }),
            Some(_) => {
                errors.push("refreshToken", "Required");
                Err(errors.into_error())
            }
            None => Err(errors.into_error()),
        }
    }
}

/// Request body for change-password.
#[derive(Debug)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn parse(body: &Value) -> Result<Self, ApiError> {
        let obj = as_object(body)?;
        let mut errors = FieldErrors::default();

        let current_password = require_string(obj, "currentPassword", &mut errors);
        let new_password = require_string(obj, "newPassword", &mut errors);
        let confirm_password = require_string(obj, "confirmPassword", &mut errors);

        if let Some(current) = &current_password {
            if current.is_empty() {
                errors.push("currentPassword", "Current password is required");
            }
        }
        if let Some(new) = &new_password {
            if new.len() < 8 {
                errors.push("newPassword", "Password must be at least 8 characters");
            } else if new.len() > 128 {
                errors.push("newPassword", "Password must be at most 128 characters");
            }
            if let Some(confirm) = &confirm_password {
                if new != confirm {
                    errors.push("confirmPassword", "Passwords don't match");
                }
            }
        }

        match (current_password, new_password) {
            (Some(current_password), Some(new_password)) if errors.is_empty() => Ok(Self {
                current_password,
                new_password,
            }),
            _ => Err(errors.into_error()),
        }
    }
}

/// Returned by signup and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub token: String,
    pub refresh_token: String,
}

/// Returned by refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
