//! # Repository Module
//!
//! Storage for the three record types of the ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reports / callers                  StockLedger                         │
//! │       │                                  │                              │
//! │       │ db.products().get_by_code()      │ ProductRepository::          │
//! │       │   (&self, pooled reads)          │   apply_delta(&mut *tx, ..)  │
//! │       ▼                                  ▼   (associated fns taking any │
//! │  ┌───────────────────────────────────────────  SqliteExecutor)          │
//! │  │ ProductRepository   products                                         │
//! │  │ MovementRepository  stock_movements                                  │
//! │  │ BatchRepository     ledger_batches + batch_lines                     │
//! │  └──────────────────────────────────────────                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product Catalog
//! - [`MovementRepository`](movement::MovementRepository) - Movement Log
//! - [`BatchRepository`](batch::BatchRepository) - Recorded batches and id generation

pub mod batch;
pub mod movement;
pub mod product;
