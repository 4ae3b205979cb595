//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Mapping
//! ```text
//! ┌──────────────────────────────┬───────────────────────┬────────┐
//! │ SaleError                    │ code                  │ status │
//! ├──────────────────────────────┼───────────────────────┼────────┤
//! │ Validation                   │ VALIDATION_ERROR      │ 400    │
//! │ NotFound                     │ NOT_FOUND             │ 404    │
//! │ InsufficientStock            │ INSUFFICIENT_STOCK    │ 409    │
//! │ Persistence                  │ PERSISTENCE_ERROR     │ 500    │
//! └──────────────────────────────┴───────────────────────┴────────┘
//! ```
//!
//! Malformed JSON bodies, query strings and headers are validation errors.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use minipos_core::ValidationError;
use minipos_sales::SaleError;

/// Error body returned by every failing endpoint.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for product B: requested 2, available 1",
///   "product_id": "B"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Product that could not be covered (insufficient stock only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    /// Whether resubmitting may succeed (persistence errors only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Not enough stock for a line (409)
    InsufficientStock,

    /// Store failure or timeout (500)
    PersistenceError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::PersistenceError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            product_id: None,
            retryable: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl From<SaleError> for ApiError {
    fn from(err: SaleError) -> Self {
        let message = err.to_string();
        match err {
            SaleError::Validation { message } => ApiError::validation(message),
            SaleError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, message),
            SaleError::InsufficientStock { product_id, .. } => ApiError {
                product_id: Some(product_id),
                ..ApiError::new(ErrorCode::InsufficientStock, message)
            },
            SaleError::Persistence {
                message: detail,
                retryable,
            } => {
                // Log the store error but return a generic message
                error!(error = %detail, retryable, "Persistence failure");
                let message = if retryable {
                    "The store is busy; retry the request"
                } else {
                    "Database operation failed"
                };
                ApiError {
                    retryable: Some(retryable),
                    ..ApiError::new(ErrorCode::PersistenceError, message)
                }
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        SaleError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_product() {
        let err: ApiError = SaleError::InsufficientStock {
            product_id: "B".to_string(),
            requested: 2,
            available: 1,
        }
        .into();

        assert_eq!(err.code.status(), StatusCode::CONFLICT);
        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["product_id"], "B");
        assert!(body.get("retryable").is_none());
    }

    #[test]
    fn test_persistence_hides_detail() {
        let err: ApiError = SaleError::timed_out("commit", std::time::Duration::from_millis(200)).into();

        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.retryable, Some(true));
        assert!(!err.message.contains("200ms"));
    }

    #[test]
    fn test_validation_keeps_message() {
        let err: ApiError = SaleError::validation("items must not be empty").into();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "items must not be empty");
    }
}
