//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use templatesmith_shared::TemplatesmithError;

/// Message returned for every non-validation failure.
const GENERIC_FAILURE: &str = "Template modification failed";

/// Handler error rendered as `{"error": "<message>"}`.
#[derive(Debug)]
#[must_use = "errors do nothing unless turned into a response"]
pub enum ApiError {
    /// Caller mistake; the message is shown as-is.
    BadRequest(String),
    /// Anything else; details are logged, the caller sees a generic message.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TemplatesmithError> for ApiError {
    fn from(err: TemplatesmithError) -> Self {
        match err {
            TemplatesmithError::Validation { message } => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::BadRequest(message) => message,
            Self::Internal(detail) => {
                error!(error = %detail, "request failed");
                GENERIC_FAILURE.to_string()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
