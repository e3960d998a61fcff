//! # stockledger-db: Storage, Ledger Engine and Reports
//!
//! This crate owns everything that touches the SQLite store: the pool,
//! the migrations, the repositories, the transactional ledger engine and
//! the read-only reporting facade.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stock Ledger Data Flow                          │
//! │                                                                         │
//! │  POS screen / returns screen / stock editor                            │
//! │       │                                  │                              │
//! │       ▼ mutations                        ▼ reads                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 stockledger-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  StockLedger  │    │    Reports    │    │  Migrations  │  │   │
//! │  │   │  (ledger/)    │    │ (reporting.rs)│    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ writer lock   │    │ pooled reads  │    │ 001_init.sql │  │   │
//! │  │   │ one tx / op   │    │ no lock       │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           └────────┬───────────┘                              │   │
//! │  │                    ▼                                          │   │
//! │  │   Repositories: ProductRepository, MovementRepository,        │   │
//! │  │                 BatchRepository                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                SQLite Database (WAL mode)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, writer lock, configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Products, movements, batches
//! - [`ledger`] - The transactional engine (`StockLedger`)
//! - [`reporting`] - Read-only queries and aggregates (`Reports`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockledger_core::{BatchKind, LedgerConfig, LineItem, NewProduct};
//! use stockledger_db::{Database, DbConfig, StockLedger};
//!
//! let db = Database::new(DbConfig::new("path/to/ledger.db")).await?;
//! let ledger = StockLedger::new(db, LedgerConfig::from_env());
//!
//! ledger.add_product(NewProduct::new("P1", "Widget", 100_00, 10, "Tools")).await?;
//! let batch = ledger
//!     .apply_batch(vec![LineItem::new("P1", 3, 100_00)], BatchKind::Sale)
//!     .await?;
//!
//! let summary = ledger.reports().sales_summary(Default::default()).await?;
//! ```

use tracing_subscriber::EnvFilter;

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod reporting;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::error::{ErrorCode, ErrorReport, LedgerError, LedgerResult};
pub use ledger::StockLedger;
pub use pool::{Database, DbConfig};
pub use reporting::Reports;

// Repository re-exports for convenience
pub use repository::batch::{generate_batch_id, BatchRepository};
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;

/// Installs the fmt subscriber for binaries and manual runs.
///
/// `RUST_LOG` overrides the default filter. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockledger_db=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
