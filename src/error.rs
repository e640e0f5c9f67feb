use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Error taxonomy for the API surface. Every variant maps to a status code
/// and a `{"error": ...}` JSON body; internal causes are logged, never
/// echoed to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),
    /// Carries either a plain message or a `{"fieldErrors": ...}` object.
    #[error("validation failed")]
    Validation(serde_json::Value),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: &str) -> Self {
        Self::Validation(json!(message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!(msg)),
            Self::Validation(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, json!(msg)),
            Self::Conflict(msg) => (StatusCode::CONFLICT, json!(msg)),
            Self::Internal(err) => {
                error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!("Internal server error"))
            }
        };
        (status, Json(json!({ "error": detail }))).into_response()
    }
}
