use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::inference::InferenceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
    #[error("INFERENCE_API_KEY is not configured")]
    MissingCredential,
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("missing or invalid owner identity")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attaches the generic message shown in the `error` field of the response body.
    pub fn with_message(self, message: &'static str) -> Failure {
        Failure {
            message,
            source: self,
        }
    }
}

/// An [`ApiError`] with the endpoint's user-facing summary.
#[derive(Debug)]
pub struct Failure {
    pub message: &'static str,
    pub source: ApiError,
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = self.source.status();
        if status.is_server_error() {
            error!(error = %self.source, "{}", self.message);
        }
        let body = json!({
            "error": self.message,
            "details": self.source.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Unauthorized => "Unauthorized",
            ApiError::NotFound(_) => "Not found",
            _ => "Internal server error",
        };
        self.with_message(message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_failures_are_500() {
        assert_eq!(ApiError::MissingField("title").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::MissingCredential.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::Inference(InferenceError::EmptyResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn record_errors_keep_their_status() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound("course").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn failure_renders_status() {
        let response = ApiError::MissingField("title")
            .with_message("Failed to generate course")
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
