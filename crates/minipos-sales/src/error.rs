//! # Sale Errors
//!
//! The four ways a sale operation can fail. Every one of them leaves the
//! store exactly as it was before the call.
//!
//! ```text
//! ┌──────────────────────┬────────────────────────────────┬────────┐
//! │ SaleError            │ Raised by                      │ HTTP   │
//! ├──────────────────────┼────────────────────────────────┼────────┤
//! │ Validation           │ request rules, transitions     │ 400    │
//! │ NotFound             │ unknown product/customer/sale  │ 404    │
//! │ InsufficientStock    │ ledger conditional decrement   │ 409    │
//! │ Persistence          │ SQLite, commit timeout         │ 500    │
//! └──────────────────────┴────────────────────────────────┴────────┘
//! ```

use std::time::Duration;

use minipos_core::{CoreError, ValidationError};
use minipos_db::DbError;
use thiserror::Error;

/// Errors returned by [`SaleEngine`](crate::SaleEngine) operations.
#[derive(Debug, Error)]
pub enum SaleError {
    /// The request or the requested transition is not acceptable.
    #[error("{message}")]
    Validation { message: String },

    /// A referenced product, customer or sale does not exist.
    ///
    /// Inactive products are reported as not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough units of a product to cover one line.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// The store failed or the operation timed out. Nothing was applied.
    #[error("Persistence error: {message}")]
    Persistence { message: String, retryable: bool },
}

impl SaleError {
    pub fn validation(message: impl Into<String>) -> Self {
        SaleError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        SaleError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// The operation exceeded its time bound and was rolled back.
    pub fn timed_out(operation: &str, limit: Duration) -> Self {
        SaleError::Persistence {
            message: format!("{operation} timed out after {}ms", limit.as_millis()),
            retryable: true,
        }
    }

    /// Whether the client may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaleError::Persistence { retryable: true, .. })
    }
}

impl From<ValidationError> for SaleError {
    fn from(err: ValidationError) -> Self {
        SaleError::validation(err.to_string())
    }
}

impl From<CoreError> for SaleError {
    fn from(err: CoreError) -> Self {
        match err {
            // Drop the "Validation error: " prefix added by CoreError
            CoreError::Validation(inner) => inner.into(),
            other => SaleError::validation(other.to_string()),
        }
    }
}

impl From<DbError> for SaleError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SaleError::NotFound { entity, id },
            other => SaleError::Persistence {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for sale operations.
pub type SaleResult<T> = Result<T, SaleError>;

#[cfg(test)]
mod tests {
    use super::*;
    use minipos_core::SaleStatus;

    #[test]
    fn test_core_errors_become_validation() {
        let err: SaleError = CoreError::InvalidStatusTransition {
            from: SaleStatus::Completed,
            to: SaleStatus::Pending,
        }
        .into();
        assert!(matches!(err, SaleError::Validation { .. }));
        assert_eq!(err.to_string(), "Cannot change sale status from completed to pending");

        let err: SaleError = CoreError::Validation(ValidationError::Required {
            field: "items".into(),
        })
        .into();
        assert_eq!(err.to_string(), "items is required");
    }

    #[test]
    fn test_db_errors_map_by_kind() {
        let err: SaleError = DbError::not_found("Sale", "abc").into();
        assert!(matches!(err, SaleError::NotFound { ref id, .. } if id == "abc"));

        let err: SaleError = DbError::Busy("database is locked".into()).into();
        assert!(err.is_retryable());

        let err: SaleError = DbError::QueryFailed("syntax".into()).into();
        assert!(matches!(err, SaleError::Persistence { retryable: false, .. }));
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = SaleError::timed_out("commit", Duration::from_millis(250));
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Persistence error: commit timed out after 250ms");
    }
}
