//! # Report Types
//!
//! Filters and row shapes for the read-only reporting facade. Dashboards
//! and history views consume these; nothing here mutates the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{Direction, MovementReason};

// =============================================================================
// Filters
// =============================================================================

/// Filter for listing movements. Empty filter returns everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementFilter {
    /// Inclusive lower bound on `created_at`.
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
    /// Current category of the product.
    pub category: Option<String>,
    pub product_code: Option<String>,
    pub reason: Option<MovementReason>,
    pub direction: Option<Direction>,
}

impl MovementFilter {
    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn product(mut self, code: impl Into<String>) -> Self {
        self.product_code = Some(code.into());
        self
    }

    pub fn reason(mut self, reason: MovementReason) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Half-open time range `[from, to)`; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "Option<String>")]
    pub from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn all() -> Self {
        DateRange::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Bucket size for time-series revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Day,
    Month,
}

impl Bucket {
    /// SQLite `strftime` pattern producing the bucket label.
    pub fn strftime_pattern(self) -> &'static str {
        match self {
            Bucket::Day => "%Y-%m-%d",
            Bucket::Month => "%Y-%m",
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// Revenue in one time bucket. Returns are negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RevenueBucket {
    pub period: String,
    pub sales_cents: i64,
    pub returns_cents: i64,
    pub net_cents: i64,
    pub batch_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventorySummary {
    pub product_count: i64,
    pub total_units: i64,
    pub stock_value_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CategoryBreakdown {
    pub category: String,
    pub product_count: i64,
    pub total_units: i64,
    pub stock_value_cents: i64,
}

/// Totals over sale and return batches in a range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub return_count: i64,
    pub gross_sales_cents: i64,
    /// Negative or zero.
    pub returns_cents: i64,
    pub net_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopSeller {
    pub product_code: String,
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// Stock on hand next to the signed sum of its movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ReconciliationRow {
    pub product_code: String,
    pub quantity: i64,
    pub movement_total: i64,
}

impl ReconciliationRow {
    /// Stock minus movements; zero when the audit trail explains the stock.
    pub fn drift(&self) -> i64 {
        self.quantity - self.movement_total
    }

    pub fn is_balanced(&self) -> bool {
        self.drift() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_drift() {
        let row = ReconciliationRow {
            product_code: "P1".to_string(),
            quantity: 7,
            movement_total: 10,
        };
        assert_eq!(row.drift(), -3);
        assert!(!row.is_balanced());
    }

    #[test]
    fn test_bucket_patterns() {
        assert_eq!(Bucket::Day.strftime_pattern(), "%Y-%m-%d");
        assert_eq!(Bucket::Month.strftime_pattern(), "%Y-%m");
    }
}
