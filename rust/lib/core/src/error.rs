use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these,
// not on the human-readable message string.

/// Stable error code constants.
///
/// Clients should match on `code` from `{"code": "NOT_FOUND", "error": "..."}`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const INTERNAL: &str = "INTERNAL";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across all modules.
///
/// Each variant maps to a stable error code (see [`error_code`]) and an
/// HTTP status code. The JSON response always includes both:
///
/// ```json
/// {"code": "NOT_FOUND", "error": "device 42 not found"}
/// ```
///
/// `Storage` and `Internal` details are logged server-side and replaced by
/// an opaque message in the response.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or invalid credentials / identity. HTTP 401.
    #[error("{0}")]
    Unauthenticated(String),

    /// Caller's role does not allow the operation. HTTP 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// Referenced record does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Missing required field or empty upload. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Request body over the configured limit. HTTP 413.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Record or blob store failure. HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated(_) => error_code::UNAUTHENTICATED,
            ServiceError::PermissionDenied(_) => error_code::PERMISSION_DENIED,
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::PayloadTooLarge(_) => error_code::PAYLOAD_TOO_LARGE,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Storage(_) => "storage failure".to_string(),
            ServiceError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if matches!(self, ServiceError::Storage(_) | ServiceError::Internal(_)) {
            tracing::error!(code = self.error_code(), "{}", self);
        }
        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.error_code(),
            "error": self.public_message(),
        });
        (status, axum::Json(body)).into_response()
    }
}

// ── Extractor rejections ────────────────────────────────────────────
//
// Handlers take `Result<Extractor, Rejection>` and apply `?`, so a body or
// path that fails to parse still answers with a `{code, error}` body.

impl From<JsonRejection> for ServiceError {
    fn from(e: JsonRejection) -> Self {
        ServiceError::Validation(e.body_text())
    }
}

impl From<PathRejection> for ServiceError {
    fn from(e: PathRejection) -> Self {
        ServiceError::Validation(e.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(e: QueryRejection) -> Self {
        ServiceError::Validation(e.body_text())
    }
}

impl From<MultipartRejection> for ServiceError {
    fn from(e: MultipartRejection) -> Self {
        ServiceError::Validation(e.body_text())
    }
}

impl From<MultipartError> for ServiceError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServiceError::PayloadTooLarge(e.body_text())
        } else {
            ServiceError::Validation(e.body_text())
        }
    }
}
