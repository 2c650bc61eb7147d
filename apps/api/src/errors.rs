use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// `details` fields carry the underlying diagnostic only when the deployment
/// opted into exposing it; otherwise they are `None` and the body stays opaque.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt document: {message}")]
    CorruptDocument {
        message: String,
        details: Option<String>,
    },

    #[error("Insufficient content: {0}")]
    InsufficientContent(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Gateway failure")]
    Gateway { details: Option<String> },

    #[error("Malformed model output")]
    MalformedOutput { details: Option<String> },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFormat(_)
            | AppError::CorruptDocument { .. }
            | AppError::InsufficientContent(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::MalformedOutput { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            AppError::CorruptDocument { .. } => "CORRUPT_DOCUMENT",
            AppError::InsufficientContent(_) => "INSUFFICIENT_CONTENT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Gateway { .. } => "GATEWAY_FAILURE",
            AppError::MalformedOutput { .. } => "MALFORMED_OUTPUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The `{"status": "error", ...}` envelope, optionally tagged with the
    /// request's audit id.
    pub fn envelope(&self, audit_id: Option<Uuid>) -> Value {
        let (message, details) = match self {
            AppError::UnsupportedFormat(msg)
            | AppError::InsufficientContent(msg)
            | AppError::Validation(msg)
            | AppError::PayloadTooLarge(msg) => (msg.clone(), None),
            AppError::CorruptDocument { message, details } => (message.clone(), details.clone()),
            AppError::Gateway { details } => (
                "The audit service is temporarily unavailable".to_string(),
                details.clone(),
            ),
            AppError::MalformedOutput { details } => (
                "The audit could not be completed".to_string(),
                details.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                ("An internal server error occurred".to_string(), None)
            }
        };

        let mut error = json!({
            "code": self.code(),
            "message": message,
        });
        if let Some(details) = details {
            error["details"] = Value::String(details);
        }

        let mut body = json!({
            "status": "error",
            "error": error,
        });
        if let Some(id) = audit_id {
            body["audit_id"] = Value::String(id.to_string());
        }
        body
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope(None))).into_response()
    }
}

/// An `AppError` raised while serving a specific audit.
#[derive(Debug)]
pub struct AuditError {
    pub audit_id: Uuid,
    pub error: AppError,
}

impl IntoResponse for AuditError {
    fn into_response(self) -> Response {
        let body = self.error.envelope(Some(self.audit_id));
        (self.error.status(), Json(body)).into_response()
    }
}
