//! # Error Types
//!
//! Domain-specific error types for stockledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockledger-core errors (this file)                                   │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  stockledger-db errors (separate crate)                                │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - What callers of the engine see                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line numbers in errors are 1-based, matching what a cashier sees.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// Everything except `ConsistencyViolation` is detected before any write
/// and is safe for the caller to correct and resubmit.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product code already exists in the catalog.
    #[error("Product code '{code}' already exists")]
    DuplicateKey { code: String },

    /// Price or quantity below zero.
    #[error("{field} cannot be negative (got {value})")]
    NegativeValue { field: String, value: i64 },

    /// Entity cannot be found.
    ///
    /// `line` is set when the unknown code came from a batch line.
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
        line: Option<usize>,
    },

    /// Not enough stock for a line.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (P1 × 8)
    ///      │
    ///      ▼
    /// Projected stock for P1: 7
    ///      │
    ///      ▼
    /// InsufficientStock { code: "P1", requested: 8, available: 7 }
    ///      │
    ///      ▼
    /// Nothing written; cashier corrects the quantity
    /// ```
    #[error("Insufficient stock for {code} on line {line}: requested {requested}, available {available}")]
    InsufficientStock {
        line: usize,
        code: String,
        requested: i64,
        available: i64,
    },

    /// Batch has no line items.
    #[error("Batch has no line items")]
    EmptyBatch,

    /// A line failed a field rule (non-positive quantity, price, limits).
    #[error("Line {line} ({code}): {reason}")]
    InvalidLine {
        line: usize,
        code: String,
        reason: ValidationError,
    },

    /// Post-write stock went negative or disagreed with the plan.
    ///
    /// Pre-validation should make this unreachable; seeing it means a
    /// defect or an out-of-band writer.
    #[error("Consistency violation for {code}: stock would be {quantity}")]
    ConsistencyViolation { code: String, quantity: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a product code outside any batch.
    pub fn product_not_found(code: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "Product".to_string(),
            id: code.into(),
            line: None,
        }
    }

    /// Creates a NotFound error for a batch id.
    pub fn batch_not_found(id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: "Batch".to_string(),
            id: id.into(),
            line: None,
        }
    }

    /// Returns the offending line number, if the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            CoreError::NotFound { line, .. } => *line,
            CoreError::InsufficientStock { line, .. } | CoreError::InvalidLine { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Invalid format (e.g., product code with spaces, bad decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            line: 1,
            code: "P1".to_string(),
            requested: 8,
            available: 7,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for P1 on line 1: requested 8, available 7"
        );
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_not_found_helpers() {
        let err = CoreError::product_not_found("P9");
        assert_eq!(err.to_string(), "Product not found: P9");
        assert_eq!(err.line(), None);

        let err = CoreError::batch_not_found("TXN-1");
        assert_eq!(err.to_string(), "Batch not found: TXN-1");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_invalid_line_message() {
        let err = CoreError::InvalidLine {
            line: 3,
            code: "P2".to_string(),
            reason: ValidationError::MustBePositive {
                field: "quantity".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Line 3 (P2): quantity must be positive");
    }
}
