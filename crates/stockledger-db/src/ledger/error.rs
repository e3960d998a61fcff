//! # Ledger Error Type
//!
//! What callers of [`StockLedger`](super::StockLedger) receive.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerError                                                            │
//! │  ├── Rejected(CoreError)      nothing was written; fix and resubmit    │
//! │  │     DuplicateKey, NegativeValue, NotFound, InsufficientStock,       │
//! │  │     EmptyBatch, InvalidLine, Validation, ConsistencyViolation       │
//! │  └── StorageFailure(DbError)  begin/commit/rollback or I/O failed;     │
//! │                               surfaced as-is, never retried            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialized Form
//! ```json
//! { "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for P1 on line 1: requested 8, available 7",
//!   "line": 1 }
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::error::DbError;
use stockledger_core::CoreError;

/// Error returned by every ledger operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A business rule rejected the request. The ledger is unchanged.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The store could not complete the unit of work.
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] DbError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::StorageFailure(DbError::from(err))
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    DuplicateKey,
    NegativeValue,
    NotFound,
    InsufficientStock,
    EmptyBatch,
    InvalidLine,
    ValidationError,
    ConsistencyViolation,
    StorageFailure,
}

/// Serializable view of a [`LedgerError`] for the UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl LedgerError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Rejected(err) => match err {
                CoreError::DuplicateKey { .. } => ErrorCode::DuplicateKey,
                CoreError::NegativeValue { .. } => ErrorCode::NegativeValue,
                CoreError::NotFound { .. } => ErrorCode::NotFound,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::EmptyBatch => ErrorCode::EmptyBatch,
                CoreError::InvalidLine { .. } => ErrorCode::InvalidLine,
                CoreError::ConsistencyViolation { .. } => ErrorCode::ConsistencyViolation,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            LedgerError::StorageFailure(_) => ErrorCode::StorageFailure,
        }
    }

    /// The 1-based line the error is tied to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            LedgerError::Rejected(err) => err.line(),
            LedgerError::StorageFailure(_) => None,
        }
    }

    /// The business rule error, if this is a rejection.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            LedgerError::Rejected(err) => Some(err),
            LedgerError::StorageFailure(_) => None,
        }
    }

    /// True when the caller may correct the request and resubmit.
    pub fn is_correctable(&self) -> bool {
        !matches!(
            self,
            LedgerError::StorageFailure(_)
                | LedgerError::Rejected(CoreError::ConsistencyViolation { .. })
        )
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            line: self.line(),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
