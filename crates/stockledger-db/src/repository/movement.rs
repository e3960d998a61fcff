//! # Movement Repository
//!
//! The Movement Log: an append-only audit trail of stock changes.
//!
//! ## Lifecycle of a Row
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record()            ← StockLedger, inside its transaction             │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  stock_movements  (never updated in place)                             │
//! │     │                                                                   │
//! │     ├── delete_for_reference()  ← reverse(batch, restore = false)      │
//! │     └── delete_for_product()    ← delete_product                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are returned in id order, which is commit order.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockledger_core::{Movement, MovementFilter, NewMovement};

/// Repository for the movement log.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// All movements of one product code, oldest first.
    pub async fn list_for_product(&self, code: &str) -> DbResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, product_id, product_code, direction, quantity,
                   reference_id, reason, note, created_at
            FROM stock_movements
            WHERE product_code = ?1
            ORDER BY id
            "#,
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// All movements carrying a reference id, oldest first.
    pub async fn list_for_reference(&self, reference_id: &str) -> DbResult<Vec<Movement>> {
        Self::find_for_reference(&self.pool, reference_id).await
    }

    /// Movements matching a filter, oldest first.
    ///
    /// ## Filter Semantics
    /// - `from` inclusive, `to` exclusive
    /// - `category` matches the product's current category
    /// - unset fields match everything
    pub async fn list(&self, filter: &MovementFilter) -> DbResult<Vec<Movement>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT m.id, m.product_id, m.product_code, m.direction, m.quantity,
                   m.reference_id, m.reason, m.note, m.created_at
            FROM stock_movements m
            JOIN products p ON p.id = m.product_id
            WHERE 1 = 1
            "#,
        );

        if let Some(from) = filter.from {
            qb.push(" AND julianday(m.created_at) >= julianday(")
                .push_bind(from)
                .push(")");
        }
        if let Some(to) = filter.to {
            qb.push(" AND julianday(m.created_at) < julianday(")
                .push_bind(to)
                .push(")");
        }
        if let Some(category) = &filter.category {
            qb.push(" AND p.category = ").push_bind(category.clone());
        }
        if let Some(code) = &filter.product_code {
            qb.push(" AND m.product_code = ").push_bind(code.clone());
        }
        if let Some(reason) = filter.reason {
            qb.push(" AND m.reason = ").push_bind(reason);
        }
        if let Some(direction) = filter.direction {
            qb.push(" AND m.direction = ").push_bind(direction);
        }
        qb.push(" ORDER BY m.id");

        let movements = qb
            .build_query_as::<Movement>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = movements.len(), "Listed movements");
        Ok(movements)
    }

    // =========================================================================
    // Executor-generic operations
    // =========================================================================

    /// Appends a movement and returns its id.
    pub async fn record<'e, E>(executor: E, movement: &NewMovement) -> DbResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        debug!(
            code = %movement.product_code,
            direction = ?movement.direction,
            quantity = movement.quantity,
            reference = %movement.reference_id,
            "Recording movement"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO stock_movements (
                product_id, product_code, direction, quantity,
                reference_id, reason, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&movement.product_id)
        .bind(&movement.product_code)
        .bind(movement.direction)
        .bind(movement.quantity)
        .bind(&movement.reference_id)
        .bind(movement.reason)
        .bind(&movement.note)
        .bind(Utc::now())
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find_for_reference<'e, E>(executor: E, reference_id: &str) -> DbResult<Vec<Movement>>
    where
        E: SqliteExecutor<'e>,
    {
        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, product_id, product_code, direction, quantity,
                   reference_id, reason, note, created_at
            FROM stock_movements
            WHERE reference_id = ?1
            ORDER BY id
            "#,
        )
        .bind(reference_id)
        .fetch_all(executor)
        .await?;

        Ok(movements)
    }

    /// Deletes every movement carrying a reference id.
    pub async fn delete_for_reference<'e, E>(executor: E, reference_id: &str) -> DbResult<u64>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM stock_movements WHERE reference_id = ?1")
            .bind(reference_id)
            .execute(executor)
            .await?;

        debug!(reference = %reference_id, deleted = result.rows_affected(), "Deleted movements");
        Ok(result.rows_affected())
    }

    /// Deletes every movement of a product.
    pub async fn delete_for_product<'e, E>(executor: E, product_id: &str) -> DbResult<u64>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM stock_movements WHERE product_id = ?1")
            .bind(product_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Signed sum of a product's movements.
    pub async fn signed_total<'e, E>(executor: E, product_id: &str) -> DbResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE direction WHEN 'IN' THEN quantity ELSE -quantity END), 0)
            FROM stock_movements
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::ProductRepository;
    use crate::{Database, DbConfig};
    use stockledger_core::{Direction, MovementReason, NewProduct};

    #[tokio::test]
    async fn test_record_and_query() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = ProductRepository::insert(db.pool(), &NewProduct::new("P1", "Widget", 100, 5, "Tools"))
            .await
            .unwrap();

        let first = MovementRepository::record(
            db.pool(),
            &NewMovement::from_delta(&p.id, "P1", 5, "INIT-1", MovementReason::InitialStock),
        )
        .await
        .unwrap();
        let second = MovementRepository::record(
            db.pool(),
            &NewMovement::from_delta(&p.id, "P1", -2, "TXN-1", MovementReason::Sale)
                .with_note(Some("counter".to_string())),
        )
        .await
        .unwrap();
        assert!(second > first);

        let all = db.movements().list_for_product("P1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].direction, Direction::Out);
        assert_eq!(all[1].note.as_deref(), Some("counter"));

        assert_eq!(MovementRepository::signed_total(db.pool(), &p.id).await.unwrap(), 3);

        let sales = db
            .movements()
            .list(&MovementFilter::default().reason(MovementReason::Sale).category("Tools"))
            .await
            .unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].reference_id, "TXN-1");

        let none = db
            .movements()
            .list(&MovementFilter::default().category("Drinks"))
            .await
            .unwrap();
        assert!(none.is_empty());

        assert_eq!(
            MovementRepository::delete_for_reference(db.pool(), "TXN-1").await.unwrap(),
            1
        );
        assert!(db.movements().list_for_reference("TXN-1").await.unwrap().is_empty());
    }
}
