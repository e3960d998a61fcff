//! # Product Repository
//!
//! The Product Catalog: storage of each product's current state.
//!
//! ## Key Operations
//! - Lookup by surrogate id or business code
//! - Listing and substring search
//! - Insert / field update / delete
//! - Delta updates of on-hand stock (ledger only)
//!
//! ## Read vs Write Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  &self methods (pool)          associated fns (any executor)           │
//! │  ─────────────────────         ──────────────────────────────          │
//! │  get_by_id / get_by_code       find_by_id / find_by_code               │
//! │  list_all / search / count     insert / update_fields / delete         │
//! │                                apply_delta                             │
//! │        │                                 │                              │
//! │        ▼                                 ▼                              │
//! │  Reports, callers              StockLedger, inside its transaction     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The catalog never writes movements. A quantity change made through
//! `update_fields` is returned to the caller, which logs it.

use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockledger_core::{NewProduct, Product, ProductUpdate};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_code("P1").await?;
/// let all = repo.list_all(true).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads (pool)
    // =========================================================================

    /// Gets a product by its surrogate id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        Self::find_by_id(&self.pool, id).await
    }

    /// Gets a product by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No product with that code
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        Self::find_by_code(&self.pool, code).await
    }

    /// Lists every product, by name or in insertion order.
    pub async fn list_all(&self, sorted_by_name: bool) -> DbResult<Vec<Product>> {
        let sql = if sorted_by_name {
            r#"
            SELECT id, code, name, price_cents, quantity, category, created_at, updated_at
            FROM products
            ORDER BY name COLLATE NOCASE, code
            "#
        } else {
            r#"
            SELECT id, code, name, price_cents, quantity, category, created_at, updated_at
            FROM products
            ORDER BY created_at, rowid
            "#
        };

        let products = sqlx::query_as::<_, Product>(sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Substring search over code, name and category.
    ///
    /// An empty term lists products by name.
    pub async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<Product>> {
        let term = term.trim();
        debug!(term = %term, limit = %limit, "Searching products");

        let pattern = format!("%{}%", term);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price_cents, quantity, category, created_at, updated_at
            FROM products
            WHERE code LIKE ?1 OR name LIKE ?1 OR category LIKE ?1
            ORDER BY name COLLATE NOCASE, code
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Counts products in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Executor-generic operations
    // =========================================================================

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
    where
        E: SqliteExecutor<'e>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price_cents, quantity, category, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    pub async fn find_by_code<'e, E>(executor: E, code: &str) -> DbResult<Option<Product>>
    where
        E: SqliteExecutor<'e>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price_cents, quantity, category, created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    /// Inserts a new product with a fresh UUID.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert<'e, E>(executor: E, new: &NewProduct) -> DbResult<Product>
    where
        E: SqliteExecutor<'e>,
    {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            code: new.code.trim().to_string(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            quantity: new.quantity,
            category: new.category.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, price_cents, quantity, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(executor)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &product.code),
            other => other,
        })?;

        Ok(product)
    }

    /// Applies a catalog edit and returns the new row with its quantity delta.
    ///
    /// The delta is `new quantity - old quantity`; the caller decides how
    /// to record it.
    pub async fn update_fields(
        conn: &mut SqliteConnection,
        id: &str,
        update: &ProductUpdate,
    ) -> DbResult<(Product, i64)> {
        let current = Self::find_by_id(&mut *conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        let updated = Product {
            name: update
                .name
                .as_deref()
                .map(str::trim)
                .unwrap_or(current.name.as_str())
                .to_string(),
            price_cents: update.price_cents.unwrap_or(current.price_cents),
            category: update
                .category
                .as_deref()
                .map(str::trim)
                .unwrap_or(current.category.as_str())
                .to_string(),
            quantity: update.quantity.unwrap_or(current.quantity),
            updated_at: Utc::now(),
            ..current.clone()
        };

        debug!(id = %id, code = %current.code, "Updating product");

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price_cents = ?3,
                category = ?4,
                quantity = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&updated.name)
        .bind(updated.price_cents)
        .bind(&updated.category)
        .bind(updated.quantity)
        .bind(updated.updated_at)
        .execute(&mut *conn)
        .await?;

        let delta = updated.quantity - current.quantity;
        Ok((updated, delta))
    }

    /// Adds `delta` to on-hand stock and returns the stored result.
    ///
    /// A result below zero fails the table's CHECK constraint with
    /// `DbError::CheckViolation`.
    pub async fn apply_delta<'e, E>(executor: E, id: &str, delta: i64) -> DbResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        debug!(id = %id, delta = %delta, "Updating stock");

        let quantity: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET quantity = quantity + ?2,
                updated_at = ?3
            WHERE id = ?1
            RETURNING quantity
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(executor)
        .await?;

        quantity.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Reads on-hand stock.
    pub async fn quantity_of<'e, E>(executor: E, id: &str) -> DbResult<i64>
    where
        E: SqliteExecutor<'e>,
    {
        let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        quantity.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product row. Movements and batch lines cascade.
    pub async fn delete<'e, E>(executor: E, id: &str) -> DbResult<()>
    where
        E: SqliteExecutor<'e>,
    {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = setup().await;
        let inserted = ProductRepository::insert(
            db.pool(),
            &NewProduct::new(" P1 ", "Widget", 100_00, 10, "Tools"),
        )
        .await
        .unwrap();

        assert_eq!(inserted.code, "P1");

        let by_code = db.products().get_by_code("P1").await.unwrap().unwrap();
        assert_eq!(by_code, inserted);

        let by_id = db.products().get_by_id(&inserted.id).await.unwrap().unwrap();
        assert_eq!(by_id.code, "P1");

        assert!(db.products().get_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_unique_violation() {
        let db = setup().await;
        let new = NewProduct::new("P1", "Widget", 100, 1, "");
        ProductRepository::insert(db.pool(), &new).await.unwrap();

        let err = ProductRepository::insert(db.pool(), &new).await.unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "P1"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_and_search() {
        let db = setup().await;
        for (code, name, category) in [
            ("B1", "bolt", "Hardware"),
            ("A1", "Anvil", "Hardware"),
            ("C1", "Cola", "Drinks"),
        ] {
            ProductRepository::insert(db.pool(), &NewProduct::new(code, name, 100, 1, category))
                .await
                .unwrap();
        }

        let sorted: Vec<String> = db
            .products()
            .list_all(true)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(sorted, vec!["Anvil", "bolt", "Cola"]);

        let hardware = db.products().search("hard", 10).await.unwrap();
        assert_eq!(hardware.len(), 2);

        assert_eq!(db.products().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_apply_delta_and_check_constraint() {
        let db = setup().await;
        let p = ProductRepository::insert(db.pool(), &NewProduct::new("P1", "Widget", 100, 3, ""))
            .await
            .unwrap();

        assert_eq!(ProductRepository::apply_delta(db.pool(), &p.id, -2).await.unwrap(), 1);
        assert_eq!(ProductRepository::quantity_of(db.pool(), &p.id).await.unwrap(), 1);

        let err = ProductRepository::apply_delta(db.pool(), &p.id, -2).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }), "{err:?}");
        assert_eq!(ProductRepository::quantity_of(db.pool(), &p.id).await.unwrap(), 1);

        let err = ProductRepository::apply_delta(db.pool(), "missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_fields_returns_quantity_delta() {
        let db = setup().await;
        let p = ProductRepository::insert(db.pool(), &NewProduct::new("P1", "Widget", 100, 3, ""))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let (updated, delta) = ProductRepository::update_fields(
            &mut conn,
            &p.id,
            &ProductUpdate::default().name("Gadget").quantity(8),
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Gadget");
        assert_eq!(updated.price_cents, 100);
        assert_eq!(updated.quantity, 8);
        assert_eq!(delta, 5);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let p = ProductRepository::insert(db.pool(), &NewProduct::new("P1", "Widget", 100, 3, ""))
            .await
            .unwrap();

        ProductRepository::delete(db.pool(), &p.id).await.unwrap();
        assert!(db.products().get_by_id(&p.id).await.unwrap().is_none());
        assert!(matches!(
            ProductRepository::delete(db.pool(), &p.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
