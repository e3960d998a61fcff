//! # stockledger-core: Pure Business Logic for the Stock Ledger
//!
//! This crate holds the rules that turn a batch of sale/return/adjustment
//! line items into stock changes. Everything here is deterministic and
//! free of I/O; `stockledger-db` feeds it snapshots and persists the result.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stock Ledger Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Callers (POS screen, returns, stock editor)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ apply_batch / reverse / reports        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  stockledger-db (engine + SQLite)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ snapshots in, plans out               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ stockledger-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   plan    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ BatchPlan │  │   rules   │  │   │
//! │  │   │ Movement  │  │           │  │  deltas   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Movement, Batch, LineItem, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`plan`] - Validation and delta computation for a batch
//! - [`report`] - Filters and row shapes for reporting
//! - [`validation`] - Field-level business rules
//! - [`config`] - Ledger limits
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use stockledger_core::money::Money;
//!
//! let price = Money::parse("100.00").unwrap();
//! assert_eq!(price.cents(), 10_000);
//! assert_eq!(price.multiply_quantity(3).to_string(), "$300.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod money;
pub mod plan;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::LedgerConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use plan::{
    net_effects, plan_batch, plan_reversal, BatchPlan, NetEffect, PlannedLine, ReversalLine,
    StockSnapshot,
};
pub use report::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single batch.
///
/// ## Business Reason
/// Keeps one unit of work bounded. Overridable through [`LedgerConfig`].
pub const MAX_BATCH_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// Guards against typing 10000 instead of 10. Overridable through
/// [`LedgerConfig`].
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum unit or catalog price, in cents ($100,000,000.00).
pub const MAX_UNIT_PRICE_CENTS: i64 = 10_000_000_000;

/// Maximum on-hand quantity settable through the catalog.
///
/// Keeps each product's `quantity * price_cents` well inside `i64`.
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

/// Stock level at or below which a product is reported as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;
