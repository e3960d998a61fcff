//! # Validation Module
//!
//! Input validation for the catalog and for batch lines. Every screen that
//! used to check its own fields now calls these once, through the ledger.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: THIS MODULE (field rules)                                    │
//! │  ├── code format, name length, bounded price/quantity                  │
//! │  └── positive line quantity and unit price                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: plan (batch rules)                                           │
//! │  └── known product, stock available, cumulative per code               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(code)                                                      │
//! │  └── CHECK (quantity >= 0)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{NewProduct, ProductUpdate};
use crate::{MAX_STOCK_QUANTITY, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CODE_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use stockledger_core::validation::validate_code;
///
/// assert!(validate_code("P1").is_ok());
/// assert!(validate_code("COKE-330").is_ok());
/// assert!(validate_code("").is_err());
/// assert!(validate_code("has space").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a category label. Empty is allowed (uncategorized).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    if category.trim().len() > MAX_CATEGORY_LEN {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: MAX_CATEGORY_LEN,
        });
    }

    Ok(())
}

/// Validates a search query: at most 100 characters. Returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Rejects values below zero with `NegativeValue`.
pub fn ensure_non_negative(field: &str, value: i64) -> CoreResult<()> {
    if value < 0 {
        return Err(CoreError::NegativeValue {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Validates a sale/return line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `max`
pub fn validate_line_quantity(qty: i64, max: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

/// Validates an adjustment delta: non-zero, `|delta| <= max`.
pub fn validate_adjustment_delta(delta: i64, max: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: "quantity".to_string(),
        });
    }

    if delta.unsigned_abs() > max.unsigned_abs() {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: -max,
            max,
        });
    }

    Ok(())
}

/// Validates a sale/return unit price: positive, at most
/// [`MAX_UNIT_PRICE_CENTS`].
pub fn validate_unit_price(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "unit price".to_string(),
        });
    }

    if cents > MAX_UNIT_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: 1,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates an adjustment unit price: zero is allowed.
pub fn validate_adjustment_price(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "unit price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// `NegativeValue` below zero, `OutOfRange` above `max`.
pub fn ensure_within(field: &str, value: i64, max: i64) -> CoreResult<()> {
    ensure_non_negative(field, value)?;

    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max,
        }
        .into());
    }
    Ok(())
}

/// Validates the number of lines in a batch.
pub fn validate_batch_size(lines: usize, max: usize) -> CoreResult<()> {
    if lines == 0 {
        return Err(CoreError::EmptyBatch);
    }

    if lines > max {
        return Err(ValidationError::OutOfRange {
            field: "batch lines".to_string(),
            min: 1,
            max: max as i64,
        }
        .into());
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a product before it enters the catalog.
///
/// ## Example
/// ```rust
/// use stockledger_core::{validation::validate_new_product, CoreError, NewProduct};
///
/// let ok = NewProduct::new("P2", "Widget", 100_00, 5, "Tools");
/// assert!(validate_new_product(&ok).is_ok());
///
/// let bad = NewProduct::new("P2", "Widget", -1, 5, "Tools");
/// assert!(matches!(validate_new_product(&bad), Err(CoreError::NegativeValue { .. })));
/// ```
pub fn validate_new_product(product: &NewProduct) -> CoreResult<()> {
    validate_code(&product.code)?;
    validate_product_name(&product.name)?;
    validate_category(&product.category)?;
    ensure_within("price", product.price_cents, MAX_UNIT_PRICE_CENTS)?;
    ensure_within("quantity", product.quantity, MAX_STOCK_QUANTITY)?;
    Ok(())
}

/// Validates the fields present in a catalog edit.
pub fn validate_product_update(update: &ProductUpdate) -> CoreResult<()> {
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(category) = &update.category {
        validate_category(category)?;
    }
    if let Some(price) = update.price_cents {
        ensure_within("price", price, MAX_UNIT_PRICE_CENTS)?;
    }
    if let Some(quantity) = update.quantity {
        ensure_within("quantity", quantity, MAX_STOCK_QUANTITY)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
