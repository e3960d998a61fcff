//! # Transaction Recorder
//!
//! Turns a planned batch into its durable summary record, and loads or
//! erases that record for a reversal. Only the engine calls these, always
//! on the connection of its open transaction.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::batch::BatchRepository;
use crate::repository::movement::MovementRepository;
use stockledger_core::{Batch, BatchLine, BatchPlan, CoreError, Movement, PaymentMethod};

use super::error::LedgerResult;

/// Inserts the batch row and one line row per planned line.
///
/// Each line keeps a snapshot of the product's name and category so the
/// record reads the same after later catalog edits.
pub(crate) async fn finalize(
    conn: &mut SqliteConnection,
    batch_id: &str,
    plan: &BatchPlan,
    payment_method: Option<PaymentMethod>,
    note: Option<String>,
) -> DbResult<Batch> {
    let created_at = Utc::now();

    let batch = Batch {
        id: batch_id.to_string(),
        kind: plan.kind,
        total_cents: plan.total_cents,
        payment_method,
        note,
        created_at,
    };
    BatchRepository::insert(&mut *conn, &batch).await?;

    for line in &plan.lines {
        let record = BatchLine {
            id: 0,
            batch_id: batch_id.to_string(),
            line_no: line.line_no as i64,
            product_id: line.product_id.clone(),
            product_code: line.product_code.clone(),
            name_snapshot: line.name.clone(),
            category_snapshot: line.category.clone(),
            quantity: line.recorded_quantity,
            unit_price_cents: line.unit_price_cents,
            line_total_cents: line.line_total_cents,
            customer: line.customer.clone(),
            created_at,
        };
        BatchRepository::insert_line(&mut *conn, &record).await?;
    }

    debug!(batch_id = %batch_id, lines = plan.lines.len(), "Batch recorded");
    Ok(batch)
}

/// Loads a batch and the movements it produced (same reference, same
/// reason as the batch kind).
pub(crate) async fn load(
    conn: &mut SqliteConnection,
    batch_id: &str,
) -> LedgerResult<(Batch, Vec<Movement>)> {
    let batch = BatchRepository::find(&mut *conn, batch_id)
        .await?
        .ok_or_else(|| CoreError::batch_not_found(batch_id))?;

    let reason = batch.kind.movement_reason();
    let movements = MovementRepository::find_for_reference(&mut *conn, batch_id)
        .await?
        .into_iter()
        .filter(|m| m.reason == reason)
        .collect();

    Ok((batch, movements))
}

/// Deletes the batch record and its lines.
pub(crate) async fn erase(conn: &mut SqliteConnection, batch_id: &str) -> DbResult<()> {
    BatchRepository::delete(&mut *conn, batch_id).await
}
