//! HTTP error responses
//!
//! Every failure is rendered as `{"error": "<message>"}` with a matching status.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::state::StateError;

/// Message returned when BA generation fails upstream
pub const GENERATE_FAILED: &str = "Không thể tạo to-do list";

/// Message returned when plain chat fails upstream
pub const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid caller input (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unknown record (404)
    #[error("{0}")]
    NotFound(String),

    /// Any server-side failure (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StateError> for ApiError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::NotFound(what) => Self::NotFound(format!("{} not found", what)),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_state_error() {
        let err: ApiError = StateError::NotFound("TodoList abc".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "TodoList abc not found"));

        let err: ApiError = StateError::StoreError("disk full".to_string()).into();
        assert!(matches!(err, ApiError::Internal(ref m) if m.contains("disk full")));
    }
}
