//! # Batch Repository
//!
//! Storage for committed batches and their lines, plus the id generator.
//!
//! ## Batch Id Format
//! ```text
//! TXN-20261016143005-000123
//! │   │              │
//! │   │              └── microseconds (6 digits)
//! │   └── UTC date and time, YYYYMMDDHHMMSS
//! └── TXN (sale) | RET (return) | ADJ (adjustment)
//! ```
//!
//! Ids come from a process-wide clock that never repeats or goes
//! backwards: two ids generated in the same microsecond get consecutive
//! microsecond values. Ids therefore sort in generation order.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockledger_core::{Batch, BatchKind, BatchLine};

/// Prefix of movements written by `add_product`.
pub const INITIAL_STOCK_PREFIX: &str = "INIT";

/// Prefix of movements written by `edit_product`.
pub const EDIT_PREFIX: &str = "EDIT";

/// Prefix of the adjustment left behind by a reversal without restock.
pub const VOID_PREFIX: &str = "VOID";

static LAST_ID_MICROS: AtomicI64 = AtomicI64::new(0);

/// Next tick of the id clock: now, or one microsecond after the last tick.
fn next_tick() -> DateTime<Utc> {
    let now = Utc::now().timestamp_micros();
    let mut last = LAST_ID_MICROS.load(Ordering::Relaxed);

    loop {
        let next = now.max(last + 1);
        match LAST_ID_MICROS.compare_exchange_weak(last, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return DateTime::<Utc>::from_timestamp_micros(next).unwrap_or_else(Utc::now),
            Err(actual) => last = actual,
        }
    }
}

fn stamped(prefix: &str) -> String {
    let tick = next_tick();
    format!(
        "{}-{}-{:06}",
        prefix,
        tick.format("%Y%m%d%H%M%S"),
        tick.timestamp_subsec_micros()
    )
}

/// Generates a batch id for a batch kind.
///
/// ```rust
/// use stockledger_core::BatchKind;
/// use stockledger_db::repository::batch::generate_batch_id;
///
/// let a = generate_batch_id(BatchKind::Sale);
/// let b = generate_batch_id(BatchKind::Sale);
/// assert!(a.starts_with("TXN-"));
/// assert!(a < b);
/// ```
pub fn generate_batch_id(kind: BatchKind) -> String {
    stamped(kind.id_prefix())
}

/// Generates a reference tag for movements that belong to no batch.
pub fn synthetic_reference(prefix: &str) -> String {
    stamped(prefix)
}

/// Repository for recorded batches.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    /// Creates a new BatchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Gets a batch by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Batch>> {
        Self::find(&self.pool, id).await
    }

    /// Lines of a batch, in submission order.
    pub async fn lines(&self, batch_id: &str) -> DbResult<Vec<BatchLine>> {
        let lines = sqlx::query_as::<_, BatchLine>(
            r#"
            SELECT id, batch_id, line_no, product_id, product_code,
                   name_snapshot, category_snapshot, quantity,
                   unit_price_cents, line_total_cents, customer, created_at
            FROM batch_lines
            WHERE batch_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Most recent batches first, optionally of one kind.
    pub async fn list(&self, kind: Option<BatchKind>, limit: u32) -> DbResult<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(
            r#"
            SELECT id, kind, total_cents, payment_method, note, created_at
            FROM ledger_batches
            WHERE (?1 IS NULL OR kind = ?1)
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#,
        )
        .bind(kind)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    // =========================================================================
    // Executor-generic operations
    // =========================================================================

    pub async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<Batch>>
    where
        E: SqliteExecutor<'e>,
    {
        let batch = sqlx::query_as::<_, Batch>(
            r#"
            SELECT id, kind, total_cents, payment_method, note, created_at
            FROM ledger_batches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(batch)
    }

    pub async fn insert<'e, E>(executor: E, batch: &Batch) -> DbResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        debug!(id = %batch.id, kind = ?batch.kind, total = batch.total_cents, "Inserting batch");

        sqlx::query(
            r#"
            INSERT INTO ledger_batches (id, kind, total_cents, payment_method, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&batch.id)
        .bind(batch.kind)
        .bind(batch.total_cents)
        .bind(batch.payment_method)
        .bind(&batch.note)
        .bind(batch.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Inserts a line. `line.id` is ignored; the row id is returned.
    pub async fn insert_line<'e, E>(executor: E, line: &BatchLine) -> DbResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO batch_lines (
                batch_id, line_no, product_id, product_code,
                name_snapshot, category_snapshot, quantity,
                unit_price_cents, line_total_cents, customer, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&line.batch_id)
        .bind(line.line_no)
        .bind(&line.product_id)
        .bind(&line.product_code)
        .bind(&line.name_snapshot)
        .bind(&line.category_snapshot)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.line_total_cents)
        .bind(&line.customer)
        .bind(line.created_at)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Deletes a batch; its lines cascade.
    pub async fn delete<'e, E>(executor: E, id: &str) -> DbResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM ledger_batches WHERE id = ?1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", id));
        }

        Ok(())
    }

    /// Removes a product's lines from every batch.
    ///
    /// Totals of the touched batches are recomputed from their remaining
    /// lines, and batches left with no lines are deleted. Returns the
    /// number of batches deleted.
    pub async fn remove_product_lines(conn: &mut SqliteConnection, product_id: &str) -> DbResult<u64> {
        let touched: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT batch_id FROM batch_lines WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM batch_lines WHERE product_id = ?1")
            .bind(product_id)
            .execute(&mut *conn)
            .await?;

        let mut emptied = 0;
        for batch_id in &touched {
            let remaining: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM batch_lines WHERE batch_id = ?1")
                    .bind(batch_id)
                    .fetch_one(&mut *conn)
                    .await?;

            if remaining == 0 {
                Self::delete(&mut *conn, batch_id).await?;
                emptied += 1;
                continue;
            }

            sqlx::query(
                r#"
                UPDATE ledger_batches
                SET total_cents = (
                    SELECT COALESCE(SUM(line_total_cents), 0)
                    FROM batch_lines
                    WHERE batch_id = ?1
                )
                WHERE id = ?1
                "#,
            )
            .bind(batch_id)
            .execute(&mut *conn)
            .await?;
        }

        debug!(
            product_id = %product_id,
            touched = touched.len(),
            emptied,
            "Removed product lines from batches"
        );
        Ok(emptied)
    }
}
