//! # Domain Types
//!
//! Core domain types used throughout the stock ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Movement     │   │     Batch       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  product_id     │   │  id (TXN-...)   │       │
//! │  │  code (business)│   │  direction      │   │  kind           │       │
//! │  │  price_cents    │   │  quantity       │   │  total_cents    │       │
//! │  │  quantity       │   │  reference_id ──┼──►│  payment_method │       │
//! │  └─────────────────┘   │  reason         │   └────────┬────────┘       │
//! │                        └─────────────────┘            │ 1..n           │
//! │                                               ┌───────▼─────────┐       │
//! │                                               │   BatchLine     │       │
//! │                                               │  (snapshot)     │       │
//! │                                               └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4, immutable, used for database relations
//! - `code`: caller-supplied business key, unique across the catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Surrogate key (UUID v4).
    pub id: String,

    /// Caller-supplied unique product code.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Unit price in cents.
    pub price_cents: i64,

    /// On-hand stock. Never negative.
    pub quantity: i64,

    /// Category label (may be empty).
    pub category: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the stock on hand at the current price.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }

    /// Checks whether `quantity` units can be taken out of stock.
    ///
    /// Selling the last unit is allowed.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

/// Input for adding a product to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub price_cents: i64,
    /// Opening stock; recorded as an `INITIAL_STOCK` movement when > 0.
    pub quantity: i64,
    pub category: String,
}

impl NewProduct {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
        quantity: i64,
        category: impl Into<String>,
    ) -> Self {
        NewProduct {
            code: code.into(),
            name: name.into(),
            price_cents,
            quantity,
            category: category.into(),
        }
    }
}

/// Direct catalog edit. `None` leaves the field untouched.
///
/// A changed `quantity` is turned into an `ADJUSTMENT` movement by the
/// ledger, never written silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price_cents: Option<i64>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = Some(price_cents);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// True if the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price_cents.is_none()
            && self.category.is_none()
            && self.quantity.is_none()
    }
}

// =============================================================================
// Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Direction for a signed stock delta. Zero counts as `In`.
    pub fn from_delta(delta: i64) -> Self {
        if delta < 0 {
            Direction::Out
        } else {
            Direction::In
        }
    }

    /// +1 for `In`, -1 for `Out`.
    pub fn sign(self) -> i64 {
        match self {
            Direction::In => 1,
            Direction::Out => -1,
        }
    }
}

/// Why a movement happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementReason {
    Sale,
    Return,
    InitialStock,
    Adjustment,
    SaleDeletionRestore,
}

/// One audit-log row: a single signed quantity change to one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Movement {
    /// Autoincrement id. Orders movements by commit.
    pub id: i64,
    pub product_id: String,
    pub product_code: String,
    pub direction: Direction,
    /// Magnitude, always > 0.
    pub quantity: i64,
    /// Batch id, or a synthetic tag such as `INIT-...` / `EDIT-...`.
    pub reference_id: String,
    pub reason: MovementReason,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// The movement as a signed stock delta.
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.direction.sign() * self.quantity
    }
}

/// A movement about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub product_id: String,
    pub product_code: String,
    pub direction: Direction,
    pub quantity: i64,
    pub reference_id: String,
    pub reason: MovementReason,
    pub note: Option<String>,
}

impl NewMovement {
    /// Builds a movement from a signed delta (magnitude + direction).
    pub fn from_delta(
        product_id: impl Into<String>,
        product_code: impl Into<String>,
        delta: i64,
        reference_id: impl Into<String>,
        reason: MovementReason,
    ) -> Self {
        NewMovement {
            product_id: product_id.into(),
            product_code: product_code.into(),
            direction: Direction::from_delta(delta),
            quantity: delta.abs(),
            reference_id: reference_id.into(),
            reason,
            note: None,
        }
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}

// =============================================================================
// Batch Kind
// =============================================================================

/// The kind of batch submitted to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchKind {
    /// Stock leaves: each line decrements by its quantity.
    Sale,
    /// Stock comes back: each line increments by its quantity.
    Return,
    /// Manual correction: each line carries a signed delta.
    Adjustment,
}

impl BatchKind {
    /// Prefix of generated batch ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            BatchKind::Sale => "TXN",
            BatchKind::Return => "RET",
            BatchKind::Adjustment => "ADJ",
        }
    }

    /// Reason recorded on the movements of this batch kind.
    pub fn movement_reason(self) -> MovementReason {
        match self {
            BatchKind::Sale => MovementReason::Sale,
            BatchKind::Return => MovementReason::Return,
            BatchKind::Adjustment => MovementReason::Adjustment,
        }
    }

    /// Stock delta for a line quantity.
    ///
    /// ```rust
    /// use stockledger_core::BatchKind;
    ///
    /// assert_eq!(BatchKind::Sale.stock_delta(3), -3);
    /// assert_eq!(BatchKind::Return.stock_delta(3), 3);
    /// assert_eq!(BatchKind::Adjustment.stock_delta(-2), -2);
    /// ```
    pub fn stock_delta(self, quantity: i64) -> i64 {
        match self {
            BatchKind::Sale => -quantity,
            BatchKind::Return | BatchKind::Adjustment => quantity,
        }
    }

    /// Quantity as stored on the batch line.
    ///
    /// Returns are stored negative so that summing line totals across
    /// sales and returns gives net revenue.
    pub fn recorded_quantity(self, quantity: i64) -> i64 {
        match self {
            BatchKind::Return => -quantity,
            BatchKind::Sale | BatchKind::Adjustment => quantity,
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    ExternalCard,
    /// Bank or mobile transfer.
    BankTransfer,
}

// =============================================================================
// Line Items & Requests
// =============================================================================

/// One product/quantity/price entry in a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_code: String,
    /// Units for sales/returns (> 0); signed delta for adjustments.
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub customer: Option<String>,
    pub note: Option<String>,
}

impl LineItem {
    pub fn new(product_code: impl Into<String>, quantity: i64, unit_price_cents: i64) -> Self {
        LineItem {
            product_code: product_code.into(),
            quantity,
            unit_price_cents,
            customer: None,
            note: None,
        }
    }

    pub fn with_customer(mut self, customer: impl Into<String>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// A batch submission with its payment metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchRequest {
    pub kind: BatchKind,
    pub lines: Vec<LineItem>,
    pub payment_method: Option<PaymentMethod>,
    pub note: Option<String>,
}

impl BatchRequest {
    pub fn new(kind: BatchKind, lines: Vec<LineItem>) -> Self {
        BatchRequest {
            kind,
            lines,
            payment_method: None,
            note: None,
        }
    }

    pub fn paid_with(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// =============================================================================
// Batch Records
// =============================================================================

/// The durable summary of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Batch {
    pub id: String,
    pub kind: BatchKind,
    /// Sum of line totals. Negative for returns.
    pub total_cents: i64,
    pub payment_method: Option<PaymentMethod>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Batch {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line of a committed batch.
/// Uses snapshot pattern to freeze product data at time of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BatchLine {
    pub id: i64,
    pub batch_id: String,
    /// 1-based position in the submitted batch.
    pub line_no: i64,
    pub product_id: String,
    pub product_code: String,
    pub name_snapshot: String,
    pub category_snapshot: String,
    /// Signed: negative on return batches.
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub customer: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl BatchLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(direction: Direction, quantity: i64) -> Movement {
        Movement {
            id: 1,
            product_id: "id".to_string(),
            product_code: "P1".to_string(),
            direction,
            quantity,
            reference_id: "TXN-1".to_string(),
            reason: MovementReason::Sale,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(movement(Direction::Out, 3).signed_delta(), -3);
        assert_eq!(movement(Direction::In, 5).signed_delta(), 5);
    }

    #[test]
    fn test_new_movement_from_delta() {
        let m = NewMovement::from_delta("id", "P1", -4, "ADJ-1", MovementReason::Adjustment);
        assert_eq!(m.direction, Direction::Out);
        assert_eq!(m.quantity, 4);

        let m = NewMovement::from_delta("id", "P1", 2, "EDIT-1", MovementReason::Adjustment);
        assert_eq!(m.direction, Direction::In);
        assert_eq!(m.quantity, 2);
    }

    #[test]
    fn test_batch_kind_rules() {
        assert_eq!(BatchKind::Sale.id_prefix(), "TXN");
        assert_eq!(BatchKind::Return.id_prefix(), "RET");
        assert_eq!(BatchKind::Return.recorded_quantity(2), -2);
        assert_eq!(BatchKind::Sale.movement_reason(), MovementReason::Sale);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&BatchKind::Sale).unwrap(), "\"SALE\"");
        assert_eq!(serde_json::to_string(&Direction::Out).unwrap(), "\"OUT\"");
        assert_eq!(
            serde_json::to_string(&MovementReason::SaleDeletionRestore).unwrap(),
            "\"SALE_DELETION_RESTORE\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::ExternalCard).unwrap(),
            "\"external_card\""
        );
    }

    #[test]
    fn test_product_update_is_empty() {
        assert!(ProductUpdate::default().is_empty());
        assert!(!ProductUpdate::default().quantity(3).is_empty());
    }

    #[test]
    fn test_can_sell_last_unit() {
        let now = Utc::now();
        let product = Product {
            id: "id".to_string(),
            code: "P1".to_string(),
            name: "Widget".to_string(),
            price_cents: 10_000,
            quantity: 7,
            category: "Tools".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(product.can_sell(7));
        assert!(!product.can_sell(8));
        assert_eq!(product.stock_value().cents(), 70_000);
    }
}
