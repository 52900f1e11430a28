//! Unified error handling with Sentry integration.
//!
//! All failures surface as one [`AppError`] taxonomy and are translated at
//! the HTTP boundary into the client envelope
//! `{"success": false, "message": ..., "error_kind": ...}`. Route handlers
//! and services return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Application-level error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input (empty line list, blank address fields).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Product, variant, order, or cart absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Requested quantity exceeds live stock; carries the product name.
    #[error("Insufficient stock for product {product}")]
    InsufficientStock { product: String },

    /// Illegal state transition or uniqueness clash.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller lacks ownership or role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// No verified identity attached to the request.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Store connection lost or a write timed out; callers may retry.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Invariant breakage inside the server; details stay out of responses.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind reported in the error envelope.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status class for this kind.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::StockConflict { product } => Self::InsufficientStock { product },
            StoreError::Database(e) => Self::Unavailable(format!("store error: {e}")),
            StoreError::DataCorruption(msg) => Self::Internal(msg),
        }
    }
}

/// The client-facing failure envelope.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    error_kind: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-class errors to Sentry
        if matches!(self, Self::Internal(_) | Self::Unavailable(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Unavailable(_) => "Service busy, please retry".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            success: false,
            message,
            error_kind: self.kind(),
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
