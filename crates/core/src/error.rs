//! Billing error types shared by every engine in this crate.

use crmdesk_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by numbering, conversion, reconciliation, and scheduling.
///
/// Precondition failures are detected before any write, so callers can roll
/// back the surrounding transaction and report the error without side effects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Referenced document, payment, or credit note is absent.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `invoice`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Source document was already converted, or is in a state that forbids the action.
    #[error("{0}")]
    Conflict(String),

    /// Credit application exceeds the note's remaining balance.
    #[error("requested {requested} exceeds remaining credit {remaining}")]
    InsufficientBalance {
        /// Amount the caller asked to apply.
        requested: Decimal,
        /// Credit still available on the note.
        remaining: Decimal,
    },

    /// Malformed monetary or date input.
    #[error("{0}")]
    Validation(String),

    /// Underlying data store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl BillingError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a store error.
    #[must_use]
    pub fn store(msg: impl ToString) -> Self {
        Self::Store(msg.to_string())
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::InsufficientBalance { .. } => 422,
            Self::Validation(_) => 400,
            Self::Store(_) => 500,
        }
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        let message = err.to_string();
        match err {
            BillingError::NotFound { .. } => Self::NotFound(message),
            BillingError::Conflict(_) => Self::Conflict(message),
            BillingError::InsufficientBalance { .. } => Self::InsufficientBalance(message),
            BillingError::Validation(_) => Self::Validation(message),
            BillingError::Store(_) => Self::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(BillingError::not_found("invoice", 7), "NOT_FOUND", 404)]
    #[case(BillingError::conflict("already converted"), "CONFLICT", 409)]
    #[case(
        BillingError::InsufficientBalance { requested: dec!(151), remaining: dec!(150) },
        "INSUFFICIENT_BALANCE",
        422
    )]
    #[case(BillingError::validation("bad amount"), "VALIDATION_ERROR", 400)]
    #[case(BillingError::store("connection reset"), "STORE_ERROR", 500)]
    fn test_codes_and_statuses(
        #[case] err: BillingError,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        assert_eq!(err.error_code(), code);
        assert_eq!(err.http_status_code(), status);

        let app: AppError = err.into();
        assert_eq!(app.error_code(), code);
        assert_eq!(app.status_code(), status);
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = BillingError::InsufficientBalance {
            requested: dec!(151.00),
            remaining: dec!(150.00),
        };
        assert_eq!(
            err.to_string(),
            "requested 151.00 exceeds remaining credit 150.00"
        );
    }

    #[test]
    fn test_not_found_message_carries_entity() {
        let err = BillingError::not_found("credit note", "abc");
        assert_eq!(err.to_string(), "credit note abc not found");
    }
}
