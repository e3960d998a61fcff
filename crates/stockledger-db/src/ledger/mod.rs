//! # Stock Ledger Engine
//!
//! The only writer of stock. Every sale, return, adjustment, reversal and
//! catalog change goes through [`StockLedger`], and each one is a single
//! unit of work.
//!
//! ## Batch State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(BatchRequest)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  acquire writer lock ─► BEGIN                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  VALIDATE   snapshots read in the transaction → plan_batch()           │
//! │       │     (no writes yet; any error → ROLLBACK, Rejected)            │
//! │       ▼                                                                 │
//! │  APPLY      per line: quantity += delta                                │
//! │       │               re-read == planned stock_after, else             │
//! │       │               ConsistencyViolation (logged, ROLLBACK)          │
//! │       │               append movement (reference = batch id)           │
//! │       ▼                                                                 │
//! │  RECORD     batch row + line rows (recorder::finalize)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ─► batch id        (commit failure → StorageFailure)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Isolation
//! The writer lock lives on [`Database`] and is shared by every clone, so
//! two ledgers on the same handle never interleave. Every unit of work
//! opens with `BEGIN IMMEDIATE`, which takes SQLite's write lock before
//! the first read; handles opened separately on the same file queue on
//! that lock (up to the busy timeout) instead of failing at commit.
//! Stock is read inside the transaction after both locks are held, so a
//! second batch on the same product always plans against the first
//! one's committed result.

pub mod error;
mod recorder;

use std::collections::HashMap;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{error, info, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::reporting::Reports;
use crate::repository::batch::{
    generate_batch_id, synthetic_reference, BatchRepository, EDIT_PREFIX, INITIAL_STOCK_PREFIX,
    VOID_PREFIX,
};
use crate::repository::movement::MovementRepository;
use crate::repository::product::ProductRepository;
use stockledger_core::validation::{validate_new_product, validate_product_update};
use stockledger_core::{
    net_effects, plan_batch, plan_reversal, BatchKind, BatchRequest, CoreError, LedgerConfig,
    LineItem, MovementReason, NewMovement, NewProduct, Product, ProductUpdate, StockSnapshot,
};

pub use error::{ErrorCode, ErrorReport, LedgerError, LedgerResult};

/// The stock ledger engine.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./stock.db")).await?;
/// let ledger = StockLedger::new(db, LedgerConfig::from_env());
///
/// let p1 = ledger.add_product(NewProduct::new("P1", "Widget", 100_00, 10, "Tools")).await?;
/// let batch_id = ledger
///     .apply_batch(vec![LineItem::new("P1", 3, 100_00)], BatchKind::Sale)
///     .await?;
/// ledger.reverse(&batch_id, true).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockLedger {
    db: Database,
    config: LedgerConfig,
}

impl StockLedger {
    pub fn new(db: Database, config: LedgerConfig) -> Self {
        StockLedger { db, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The read-only reporting facade over the same database.
    pub fn reports(&self) -> Reports {
        Reports::new(self.db.clone(), self.config.clone())
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Applies a batch of line items. Shorthand for [`StockLedger::submit`]
    /// without payment metadata.
    pub async fn apply_batch(&self, lines: Vec<LineItem>, kind: BatchKind) -> LedgerResult<String> {
        self.submit(BatchRequest::new(kind, lines)).await
    }

    /// Applies a batch all-or-nothing and returns its generated id.
    ///
    /// ## Errors
    /// - `Rejected(EmptyBatch | InvalidLine | NotFound | InsufficientStock | ...)`
    ///   for the first failing line; nothing is written
    /// - `Rejected(ConsistencyViolation)` if stored stock disagrees with
    ///   the plan; rolled back
    /// - `StorageFailure` if the transaction cannot begin, commit or roll back
    pub async fn submit(&self, request: BatchRequest) -> LedgerResult<String> {
        let _writer = self.db.lock_writer().await;
        let mut tx = self.begin().await?;

        let outcome = self.submit_in(&mut tx, &request).await;
        let batch_id = settle(tx, outcome, "submit").await?;

        info!(
            batch_id = %batch_id,
            kind = ?request.kind,
            lines = request.lines.len(),
            "Batch committed"
        );
        Ok(batch_id)
    }

    async fn submit_in(
        &self,
        conn: &mut SqliteConnection,
        request: &BatchRequest,
    ) -> LedgerResult<String> {
        let codes = request.lines.iter().map(|l| l.product_code.as_str());
        let snapshots = load_snapshots(conn, codes).await?;

        let plan = plan_batch(request.kind, &request.lines, &self.config, &snapshots)?;

        let batch_id = generate_batch_id(request.kind);
        let reason = request.kind.movement_reason();

        for line in &plan.lines {
            apply_stock_change(conn, &line.product_id, &line.product_code, line.delta, line.stock_after)
                .await?;

            let movement = NewMovement::from_delta(
                &line.product_id,
                &line.product_code,
                line.delta,
                &batch_id,
                reason,
            )
            .with_note(line.note.clone().or_else(|| request.note.clone()));
            MovementRepository::record(&mut *conn, &movement).await?;
        }

        recorder::finalize(
            conn,
            &batch_id,
            &plan,
            request.payment_method,
            request.note.clone(),
        )
        .await?;

        Ok(batch_id)
    }

    /// Removes a batch from history.
    ///
    /// ## `restore_stock = true`
    /// The batch's movements stay in the log and a compensating movement
    /// per product undoes their net effect on stock (`SALE_DELETION_RESTORE`
    /// for sales, `ADJUSTMENT` otherwise, same reference id). Undoing a
    /// return can fail with `InsufficientStock`.
    ///
    /// ## `restore_stock = false`
    /// Stock is left as-is. The batch's movements are deleted and replaced
    /// by one `ADJUSTMENT` per product with the same net effect, referenced
    /// as `VOID-<batch id>`, so stock still equals the sum of movements.
    ///
    /// Either way the batch record and its lines are deleted.
    pub async fn reverse(&self, batch_id: &str, restore_stock: bool) -> LedgerResult<()> {
        let _writer = self.db.lock_writer().await;
        let mut tx = self.begin().await?;

        let outcome = self.reverse_in(&mut tx, batch_id, restore_stock).await;
        let kind = settle(tx, outcome, "reverse").await?;

        info!(batch_id = %batch_id, kind = ?kind, restore_stock, "Batch reversed");
        Ok(())
    }

    async fn reverse_in(
        &self,
        conn: &mut SqliteConnection,
        batch_id: &str,
        restore_stock: bool,
    ) -> LedgerResult<BatchKind> {
        let (batch, movements) = recorder::load(conn, batch_id).await?;

        if restore_stock {
            let codes = movements.iter().map(|m| m.product_code.as_str());
            let snapshots = load_snapshots(conn, codes).await?;
            let reason = match batch.kind {
                BatchKind::Sale => MovementReason::SaleDeletionRestore,
                BatchKind::Return | BatchKind::Adjustment => MovementReason::Adjustment,
            };

            for line in plan_reversal(&movements, &snapshots)? {
                apply_stock_change(conn, &line.product_id, &line.product_code, line.delta, line.stock_after)
                    .await?;

                let movement = NewMovement::from_delta(
                    &line.product_id,
                    &line.product_code,
                    line.delta,
                    batch_id,
                    reason,
                )
                .with_note(Some(format!("Reversal of {batch_id}")));
                MovementRepository::record(&mut *conn, &movement).await?;
            }
        } else {
            let effects = net_effects(&movements);
            MovementRepository::delete_for_reference(&mut *conn, batch_id).await?;

            let reference = format!("{VOID_PREFIX}-{batch_id}");
            for effect in effects {
                let movement = NewMovement::from_delta(
                    effect.product_id,
                    effect.product_code,
                    effect.delta,
                    &reference,
                    MovementReason::Adjustment,
                )
                .with_note(Some(format!("{batch_id} removed from history without restocking")));
                MovementRepository::record(&mut *conn, &movement).await?;
            }
        }

        recorder::erase(conn, batch_id).await?;
        Ok(batch.kind)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Adds a product. Opening stock above zero is logged as an
    /// `INITIAL_STOCK` movement in the same unit of work.
    pub async fn add_product(&self, new: NewProduct) -> LedgerResult<Product> {
        validate_new_product(&new)?;

        let _writer = self.db.lock_writer().await;
        let mut tx = self.begin().await?;

        let outcome = add_product_in(&mut tx, &new).await;
        let product = settle(tx, outcome, "add_product").await?;

        info!(code = %product.code, quantity = product.quantity, "Product added");
        Ok(product)
    }

    /// Edits catalog fields. A changed quantity is logged as an
    /// `ADJUSTMENT` movement (reference `EDIT-...`).
    pub async fn edit_product(&self, id: &str, update: ProductUpdate) -> LedgerResult<Product> {
        validate_product_update(&update)?;

        let _writer = self.db.lock_writer().await;
        let mut tx = self.begin().await?;

        let outcome = edit_product_in(&mut tx, id, &update).await;
        let (product, delta) = settle(tx, outcome, "edit_product").await?;

        info!(code = %product.code, delta, "Product edited");
        Ok(product)
    }

    /// Deletes a product together with its movements and batch lines.
    ///
    /// Batches that contained the product keep their other lines and get
    /// their totals recomputed; batches left empty are deleted.
    pub async fn delete_product(&self, id: &str) -> LedgerResult<()> {
        let _writer = self.db.lock_writer().await;
        let mut tx = self.begin().await?;

        let outcome = delete_product_in(&mut tx, id).await;
        let code = settle(tx, outcome, "delete_product").await?;

        info!(code = %code, "Product deleted");
        Ok(())
    }

    async fn begin(&self) -> LedgerResult<Transaction<'static, Sqlite>> {
        self.db
            .pool()
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| LedgerError::StorageFailure(DbError::transaction(e)))
    }
}

// =============================================================================
// Units of work
// =============================================================================

async fn add_product_in(conn: &mut SqliteConnection, new: &NewProduct) -> LedgerResult<Product> {
    let product = ProductRepository::insert(&mut *conn, new)
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => LedgerError::from(CoreError::DuplicateKey {
                code: new.code.trim().to_string(),
            }),
            other => other.into(),
        })?;

    if product.quantity > 0 {
        let movement = NewMovement::from_delta(
            &product.id,
            &product.code,
            product.quantity,
            synthetic_reference(INITIAL_STOCK_PREFIX),
            MovementReason::InitialStock,
        );
        MovementRepository::record(&mut *conn, &movement).await?;
    }

    Ok(product)
}

async fn edit_product_in(
    conn: &mut SqliteConnection,
    id: &str,
    update: &ProductUpdate,
) -> LedgerResult<(Product, i64)> {
    let (product, delta) = ProductRepository::update_fields(conn, id, update)
        .await
        .map_err(|e| match e {
            DbError::NotFound { .. } => LedgerError::from(CoreError::product_not_found(id)),
            other => other.into(),
        })?;

    if delta != 0 {
        let movement = NewMovement::from_delta(
            &product.id,
            &product.code,
            delta,
            synthetic_reference(EDIT_PREFIX),
            MovementReason::Adjustment,
        )
        .with_note(Some("Catalog edit".to_string()));
        MovementRepository::record(&mut *conn, &movement).await?;
    }

    Ok((product, delta))
}

async fn delete_product_in(conn: &mut SqliteConnection, id: &str) -> LedgerResult<String> {
    let product = ProductRepository::find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| CoreError::product_not_found(id))?;

    let movements = MovementRepository::delete_for_product(&mut *conn, id).await?;
    let emptied = BatchRepository::remove_product_lines(conn, id).await?;
    ProductRepository::delete(&mut *conn, id).await?;

    info!(
        code = %product.code,
        movements,
        emptied_batches = emptied,
        "Product history removed"
    );
    Ok(product.code)
}

/// Reads a snapshot of each distinct code that exists.
async fn load_snapshots<'a>(
    conn: &mut SqliteConnection,
    codes: impl Iterator<Item = &'a str>,
) -> LedgerResult<HashMap<String, StockSnapshot>> {
    let mut snapshots = HashMap::new();

    for code in codes {
        if snapshots.contains_key(code) {
            continue;
        }
        if let Some(product) = ProductRepository::find_by_code(&mut *conn, code).await? {
            snapshots.insert(code.to_string(), StockSnapshot::from(&product));
        }
    }

    Ok(snapshots)
}

/// Writes a stock delta and checks the stored result against the plan.
async fn apply_stock_change(
    conn: &mut SqliteConnection,
    product_id: &str,
    code: &str,
    delta: i64,
    expected: i64,
) -> LedgerResult<()> {
    let stored = match ProductRepository::apply_delta(&mut *conn, product_id, delta).await {
        Ok(quantity) => quantity,
        Err(DbError::CheckViolation { constraint }) => {
            let current = ProductRepository::quantity_of(&mut *conn, product_id).await?;
            error!(
                code = %code,
                delta,
                current,
                constraint = %constraint,
                "Stock update rejected by the store"
            );
            return Err(CoreError::ConsistencyViolation {
                code: code.to_string(),
                quantity: current.saturating_add(delta),
            }
            .into());
        }
        Err(other) => return Err(other.into()),
    };

    if stored < 0 || stored != expected {
        error!(
            code = %code,
            delta,
            stored,
            expected,
            "Stored stock disagrees with plan"
        );
        return Err(CoreError::ConsistencyViolation {
            code: code.to_string(),
            quantity: stored,
        }
        .into());
    }

    Ok(())
}

/// Commits on success, rolls back on error.
async fn settle<T>(
    tx: Transaction<'_, Sqlite>,
    outcome: LedgerResult<T>,
    operation: &'static str,
) -> LedgerResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(|e| {
                error!(operation, error = %e, "Commit failed");
                LedgerError::StorageFailure(DbError::transaction(e))
            })?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(
                    operation,
                    error = %err,
                    rollback_error = %rollback_err,
                    "Rollback failed"
                );
                return Err(LedgerError::StorageFailure(DbError::transaction(rollback_err)));
            }

            match &err {
                LedgerError::Rejected(CoreError::ConsistencyViolation { .. }) => {
                    error!(operation, error = %err, "Rolled back after consistency violation")
                }
                LedgerError::Rejected(_) => warn!(operation, error = %err, "Rejected"),
                LedgerError::StorageFailure(_) => {
                    error!(operation, error = %err, "Rolled back after storage failure")
                }
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use stockledger_core::{Direction, PaymentMethod};

    async fn ledger() -> StockLedger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        StockLedger::new(db, LedgerConfig::default())
    }

    #[tokio::test]
    async fn test_add_product_writes_initial_stock_movement() {
        let ledger = ledger().await;
        ledger
            .add_product(NewProduct::new("P2", "Gadget", 250, 5, "Tools"))
            .await
            .unwrap();

        let movements = ledger.reports().movements_for_product("P2").await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].direction, Direction::In);
        assert_eq!(movements[0].quantity, 5);
        assert_eq!(movements[0].reason, MovementReason::InitialStock);
        assert!(movements[0].reference_id.starts_with("INIT-"));
    }

    #[tokio::test]
    async fn test_add_product_without_stock_has_no_movement() {
        let ledger = ledger().await;
        ledger
            .add_product(NewProduct::new("P0", "Empty", 100, 0, ""))
            .await
            .unwrap();
        assert!(ledger.reports().movements_for_product("P0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_product_rejections() {
        let ledger = ledger().await;
        ledger
            .add_product(NewProduct::new("P1", "Widget", 100, 1, ""))
            .await
            .unwrap();

        let err = ledger
            .add_product(NewProduct::new("P1", "Other", 100, 1, ""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::DuplicateKey { ref code }) if code == "P1"
        ));

        let err = ledger
            .add_product(NewProduct::new("P9", "Bad", -1, 1, ""))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NegativeValue);

        assert_eq!(ledger.reports().list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_records_payment_and_customer() {
        let ledger = ledger().await;
        ledger
            .add_product(NewProduct::new("P1", "Widget", 100_00, 10, "Tools"))
            .await
            .unwrap();

        let request = BatchRequest::new(
            BatchKind::Sale,
            vec![LineItem::new("P1", 2, 95_00).with_customer("ACME")],
        )
        .paid_with(PaymentMethod::Cash)
        .with_note("counter 1");

        let batch_id = ledger.submit(request).await.unwrap();
        assert!(batch_id.starts_with("TXN-"));

        let reports = ledger.reports();
        let batch = reports.get_batch(&batch_id).await.unwrap();
        assert_eq!(batch.total_cents, 190_00);
        assert_eq!(batch.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(batch.note.as_deref(), Some("counter 1"));

        let lines = reports.batch_lines(&batch_id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].customer.as_deref(), Some("ACME"));
        assert_eq!(lines[0].name_snapshot, "Widget");
        assert_eq!(lines[0].category_snapshot, "Tools");

        let movements = reports.movements_for_reference(&batch_id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].note.as_deref(), Some("counter 1"));
    }

    #[tokio::test]
    async fn test_edit_product_logs_quantity_change() {
        let ledger = ledger().await;
        let p = ledger
            .add_product(NewProduct::new("P1", "Widget", 100, 10, "Tools"))
            .await
            .unwrap();

        let edited = ledger
            .edit_product(&p.id, ProductUpdate::default().price_cents(120).quantity(6))
            .await
            .unwrap();
        assert_eq!(edited.price_cents, 120);
        assert_eq!(edited.quantity, 6);

        let movements = ledger.reports().movements_for_product("P1").await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[1].reason, MovementReason::Adjustment);
        assert_eq!(movements[1].signed_delta(), -4);
        assert!(movements[1].reference_id.starts_with("EDIT-"));

        // Name-only edits write no movement.
        ledger
            .edit_product(&p.id, ProductUpdate::default().name("Widget XL"))
            .await
            .unwrap();
        assert_eq!(ledger.reports().movements_for_product("P1").await.unwrap().len(), 2);

        let err = ledger
            .edit_product("missing", ProductUpdate::default().name("x"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_reverse_unknown_batch() {
        let ledger = ledger().await;
        let err = ledger.reverse("TXN-NOPE", true).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::NotFound { ref entity, .. }) if entity == "Batch"
        ));
    }

    #[tokio::test]
    async fn test_reverse_return_without_stock_is_rejected() {
        let ledger = ledger().await;
        ledger
            .add_product(NewProduct::new("P1", "Widget", 100, 0, ""))
            .await
            .unwrap();

        let ret = ledger
            .apply_batch(vec![LineItem::new("P1", 2, 100)], BatchKind::Return)
            .await
            .unwrap();
        ledger
            .apply_batch(vec![LineItem::new("P1", 2, 100)], BatchKind::Sale)
            .await
            .unwrap();

        let err = ledger.reverse(&ret, true).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        // Still there, nothing changed.
        assert!(ledger.reports().get_batch(&ret).await.is_ok());
        assert_eq!(ledger.reports().get_product("P1").await.unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_delete_product_recomputes_batches() {
        let ledger = ledger().await;
        let p1 = ledger
            .add_product(NewProduct::new("P1", "Widget", 100, 10, ""))
            .await
            .unwrap();
        ledger
            .add_product(NewProduct::new("P2", "Gadget", 300, 10, ""))
            .await
            .unwrap();

        let mixed = ledger
            .apply_batch(
                vec![LineItem::new("P1", 1, 100), LineItem::new("P2", 1, 300)],
                BatchKind::Sale,
            )
            .await
            .unwrap();
        let only_p1 = ledger
            .apply_batch(vec![LineItem::new("P1", 2, 100)], BatchKind::Sale)
            .await
            .unwrap();

        ledger.delete_product(&p1.id).await.unwrap();

        let reports = ledger.reports();
        assert_eq!(reports.get_product("P1").await.unwrap_err().code(), ErrorCode::NotFound);
        assert!(reports.movements_for_product("P1").await.unwrap().is_empty());
        assert_eq!(reports.get_batch(&mixed).await.unwrap().total_cents, 300);
        assert_eq!(reports.batch_lines(&mixed).await.unwrap().len(), 1);
        assert_eq!(reports.get_batch(&only_p1).await.unwrap_err().code(), ErrorCode::NotFound);

        let err = ledger.delete_product(&p1.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_stock_mismatch_rolls_back_the_unit_of_work() {
        let ledger = ledger().await;
        let p1 = ledger
            .add_product(NewProduct::new("P1", "Widget", 100, 10, ""))
            .await
            .unwrap();
        let p2 = ledger
            .add_product(NewProduct::new("P2", "Gadget", 300, 4, ""))
            .await
            .unwrap();

        let mut tx = ledger.begin().await.unwrap();
        apply_stock_change(&mut tx, &p1.id, "P1", -3, 7).await.unwrap();
        let err = apply_stock_change(&mut tx, &p2.id, "P2", -1, 2).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::ConsistencyViolation { quantity: 3, .. })
        ));

        let err = settle(tx, Err::<(), _>(err), "apply_batch").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConsistencyViolation);
        assert_eq!(err.line(), None);

        let reports = ledger.reports();
        assert_eq!(reports.get_product("P1").await.unwrap().quantity, 10);
        assert_eq!(reports.get_product("P2").await.unwrap().quantity, 4);
        assert_eq!(reports.movements_for_product("P1").await.unwrap().len(), 1);
        assert_eq!(reports.movements_for_product("P2").await.unwrap().len(), 1);
        assert!(reports.list_batches(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_check_on_negative_stock_is_a_consistency_violation() {
        let ledger = ledger().await;
        let p1 = ledger
            .add_product(NewProduct::new("P1", "Widget", 100, 2, ""))
            .await
            .unwrap();

        let mut tx = ledger.begin().await.unwrap();
        let err = apply_stock_change(&mut tx, &p1.id, "P1", -5, 0).await.unwrap_err();
        match err {
            LedgerError::Rejected(CoreError::ConsistencyViolation { ref code, quantity }) => {
                assert_eq!(code, "P1");
                assert_eq!(quantity, -3);
            }
            ref other => panic!("expected ConsistencyViolation, got {other:?}"),
        }
        settle(tx, Err::<(), _>(err), "apply_batch").await.unwrap_err();

        assert_eq!(ledger.reports().get_product("P1").await.unwrap().quantity, 2);
    }
}
