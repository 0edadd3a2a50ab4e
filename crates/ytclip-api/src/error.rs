//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use ytclip_worker::ClipError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Detail returned for a missing or rejected download.
pub const FILE_NOT_FOUND: &str = "File not found or expired.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Clip(#[from] ClipError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Clip(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Clip(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal",
            ApiError::Clip(e) => e.category(),
        }
    }

    /// Detail safe to show in production.
    fn public_detail(&self) -> String {
        match self {
            ApiError::Clip(ClipError::TranscodeFailed(_)) => {
                "Failed to process video clip.".to_string()
            }
            ApiError::Clip(e) if e.is_client_error() => e.to_string(),
            ApiError::NotFound(_) | ApiError::BadRequest(_) => self.to_string(),
            _ => "An internal error occurred".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
            self.public_detail()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err = ApiError::from(ClipError::InvalidDuration {
            start_secs: 5,
            end_secs: 1,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_duration");

        let err = ApiError::from(ClipError::transcode_failed("exit 1"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_detail(), "Failed to process video clip.");

        let err = ApiError::from(ClipError::extraction("private video"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::not_found(FILE_NOT_FOUND);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), FILE_NOT_FOUND);
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError::internal("disk on fire");
        assert_eq!(err.public_detail(), "An internal error occurred");
        assert!(err.to_string().contains("disk on fire"));
    }
}
