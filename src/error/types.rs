use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::DetectedType;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid base64 payload: {message}")]
    InvalidBase64 { message: String },

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {size}MB exceeds limit of {limit}MB")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("Failed to process {kind} file: {message}")]
    ExtractionFailed { kind: DetectedType, message: String },

    #[error("External tool unavailable: {tool}")]
    ToolUnavailable { tool: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidBase64 { .. } => "INVALID_BASE64",
            AppError::EmptyFile => "EMPTY_FILE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
            AppError::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            AppError::ToolUnavailable { .. } => "TOOL_UNAVAILABLE",
            AppError::Timeout => "REQUEST_TIMEOUT",
            AppError::ValidationError { .. } => "VALIDATION_ERROR",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidBase64 { .. } => StatusCode::BAD_REQUEST,
            AppError::EmptyFile => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ExtractionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ToolUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Value of the envelope's `content_type` field for this error.
    pub fn envelope_kind(&self) -> &'static str {
        match self {
            AppError::UnsupportedType { .. } => "unsupported",
            _ => "error",
        }
    }

    fn detected_type(&self) -> Option<DetectedType> {
        match self {
            AppError::UnsupportedType { .. } => Some(DetectedType::Unknown),
            AppError::ExtractionFailed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let error_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        tracing::error!(
            error_code = error_code,
            status_code = %status,
            error_id = %error_id,
            error_message = %message,
            "API error occurred"
        );

        let mime_type = match &self {
            AppError::UnsupportedType { mime_type } => Some(mime_type.clone()),
            _ => None,
        };

        let body = Json(json!({
            "status": "error",
            "content_type": self.envelope_kind(),
            "detected_type": self.detected_type(),
            "mime_type": mime_type,
            "data": null,
            "message": message,
            "error": {
                "code": error_code,
                "error_id": error_id,
                "timestamp": timestamp
            }
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError {
            message: format!("JSON parsing error: {}", err),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::InvalidBase64 {
            message: err.to_string(),
        }
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError {
            message: message.into(),
        }
    }

    pub fn extraction(kind: DetectedType, message: impl Into<String>) -> Self {
        AppError::ExtractionFailed {
            kind,
            message: message.into(),
        }
    }

    pub fn unsupported(mime_type: impl Into<String>) -> Self {
        AppError::UnsupportedType {
            mime_type: mime_type.into(),
        }
    }

    pub fn tool_unavailable(tool: impl Into<String>) -> Self {
        AppError::ToolUnavailable {
            tool: tool.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
