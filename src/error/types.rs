use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use super::ExtractError;
use crate::middleware::current_request_id;
use crate::services::SizeExceeded;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Too many files: {count} exceeds limit of {limit}")]
    TooManyFiles { count: usize, limit: usize },

    #[error("Invalid upload: {message}")]
    InvalidUpload { message: String },

    #[error("Rate limit exceeded: maximum concurrent requests reached")]
    RateLimitExceeded,

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("Missing file in request")]
    MissingFile,

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::TooManyFiles { .. } => "TOO_MANY_FILES",
            AppError::InvalidUpload { .. } => "INVALID_UPLOAD",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::Extraction(ExtractError::UnsupportedFormat { .. }) => "UNSUPPORTED_FORMAT",
            AppError::Extraction(ExtractError::ReadFailure { .. }) => "READ_FAILURE",
            AppError::Extraction(ExtractError::ParseFailure { .. }) => "PARSE_FAILURE",
            AppError::Extraction(ExtractError::Cancelled) => "EXTRACTION_CANCELLED",
            AppError::Extraction(ExtractError::TimedOut { .. }) => "EXTRACTION_TIMEOUT",
            AppError::MissingFile => "MISSING_FILE",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
        }
    }

    /// Failure kind in the same vocabulary as per-file reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::FileTooLarge { .. } => "SizeExceeded",
            AppError::Extraction(err) => err.kind(),
            _ => "RequestError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::TooManyFiles { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidUpload { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Extraction(err) => match err {
                ExtractError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ExtractError::ParseFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ExtractError::ReadFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                ExtractError::TimedOut { .. } => StatusCode::REQUEST_TIMEOUT,
                ExtractError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            },
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let kind = self.kind();
        let message = self.to_string();
        let request_id = current_request_id();
        let timestamp = chrono::Utc::now().to_rfc3339();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "kind": kind,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<SizeExceeded> for AppError {
    fn from(err: SizeExceeded) -> Self {
        AppError::FileTooLarge {
            size: err.size,
            limit: err.limit,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::InvalidUpload {
            message: format!("Failed to read multipart field: {}", err),
        }
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn invalid_upload(message: impl Into<String>) -> Self {
        AppError::InvalidUpload {
            message: message.into(),
        }
    }
}
