use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tts_core::PipelineError;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No text provided")]
    NoText,

    #[error("Text too long (max {0} characters)")]
    TextTooLong(usize),

    #[error("Could not detect any languages")]
    NoLanguages,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Map a pipeline failure, hiding its detail from the client unless
    /// `expose_details` is set. The detail is always logged.
    pub fn from_pipeline(err: PipelineError, expose_details: bool) -> Self {
        match err {
            PipelineError::NoSegments => ApiError::NoLanguages,
            other => {
                tracing::error!("TTS pipeline error: {}", other);
                if expose_details {
                    ApiError::Internal(other.to_string())
                } else {
                    ApiError::Internal("Internal server error".to_string())
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoText | ApiError::TextTooLong(_) | ApiError::NoLanguages => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response structure
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
