//! # Query / Reporting Facade
//!
//! Read-only queries for dashboards and history views.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Reports                                                                │
//! │  ├── catalog      get_product, list_products, search_products,         │
//! │  │                check_availability, low_stock                        │
//! │  ├── movements    list_movements, movements_for_product,               │
//! │  │                movements_for_reference, reconcile                   │
//! │  ├── batches      get_batch, batch_lines, list_batches                 │
//! │  └── aggregates   inventory_summary, category_breakdown,               │
//! │                   revenue_by_period, sales_summary, top_selling        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here takes the writer lock. Each query is one statement, and
//! batches become visible only on commit, so no result ever contains part
//! of a batch.

use tracing::debug;

use crate::pool::Database;
use crate::ledger::LedgerResult;
use stockledger_core::validation::validate_line_quantity;
use stockledger_core::{
    Batch, BatchKind, BatchLine, Bucket, CategoryBreakdown, CoreError, DateRange,
    InventorySummary, LedgerConfig, Movement, MovementFilter, Product, ReconciliationRow,
    RevenueBucket, SalesSummary, TopSeller,
};

/// Read-only reporting facade.
#[derive(Debug, Clone)]
pub struct Reports {
    db: Database,
    config: LedgerConfig,
}

impl Reports {
    pub fn new(db: Database, config: LedgerConfig) -> Self {
        Reports { db, config }
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Gets a product by code, or `NotFound`.
    pub async fn get_product(&self, code: &str) -> LedgerResult<Product> {
        self.db
            .products()
            .get_by_code(code)
            .await?
            .ok_or_else(|| CoreError::product_not_found(code).into())
    }

    /// All products, sorted by name.
    pub async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().list_all(true).await?)
    }

    pub async fn search_products(&self, term: &str, limit: u32) -> LedgerResult<Vec<Product>> {
        Ok(self.db.products().search(term, limit).await?)
    }

    /// Whether `quantity` units of `code` can be sold right now.
    ///
    /// Unknown codes are `NotFound` rather than `false`.
    pub async fn check_availability(&self, code: &str, quantity: i64) -> LedgerResult<bool> {
        validate_line_quantity(quantity, i64::MAX).map_err(CoreError::from)?;
        let product = self.get_product(code).await?;
        Ok(product.can_sell(quantity))
    }

    /// Products at or below `threshold` (config default when `None`),
    /// lowest stock first.
    pub async fn low_stock(&self, threshold: Option<i64>) -> LedgerResult<Vec<Product>> {
        let threshold = threshold.unwrap_or(self.config.low_stock_threshold);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, name, price_cents, quantity, category, created_at, updated_at
            FROM products
            WHERE quantity <= ?1
            ORDER BY quantity, name COLLATE NOCASE
            "#,
        )
        .bind(threshold)
        .fetch_all(self.db.pool())
        .await?;

        debug!(threshold, count = products.len(), "Low stock report");
        Ok(products)
    }

    // =========================================================================
    // Movements
    // =========================================================================

    pub async fn list_movements(&self, filter: &MovementFilter) -> LedgerResult<Vec<Movement>> {
        Ok(self.db.movements().list(filter).await?)
    }

    pub async fn movements_for_product(&self, code: &str) -> LedgerResult<Vec<Movement>> {
        Ok(self.db.movements().list_for_product(code).await?)
    }

    pub async fn movements_for_reference(&self, reference_id: &str) -> LedgerResult<Vec<Movement>> {
        Ok(self.db.movements().list_for_reference(reference_id).await?)
    }

    /// Stock on hand next to the signed sum of each product's movements.
    ///
    /// Every row is balanced unless something wrote stock behind the
    /// ledger's back.
    pub async fn reconcile(&self) -> LedgerResult<Vec<ReconciliationRow>> {
        let rows = sqlx::query_as::<_, ReconciliationRow>(
            r#"
            SELECT p.code AS product_code,
                   p.quantity AS quantity,
                   COALESCE(SUM(CASE m.direction
                                    WHEN 'IN' THEN m.quantity
                                    WHEN 'OUT' THEN -m.quantity
                                END), 0) AS movement_total
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id
            ORDER BY p.code
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Batches
    // =========================================================================

    /// Gets a batch by id, or `NotFound`.
    pub async fn get_batch(&self, id: &str) -> LedgerResult<Batch> {
        self.db
            .batches()
            .get(id)
            .await?
            .ok_or_else(|| CoreError::batch_not_found(id).into())
    }

    pub async fn batch_lines(&self, batch_id: &str) -> LedgerResult<Vec<BatchLine>> {
        Ok(self.db.batches().lines(batch_id).await?)
    }

    /// Most recent batches first.
    pub async fn list_batches(&self, kind: Option<BatchKind>, limit: u32) -> LedgerResult<Vec<Batch>> {
        Ok(self.db.batches().list(kind, limit).await?)
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    pub async fn inventory_summary(&self) -> LedgerResult<InventorySummary> {
        let summary = sqlx::query_as::<_, InventorySummary>(
            r#"
            SELECT COUNT(*) AS product_count,
                   COALESCE(SUM(quantity), 0) AS total_units,
                   COALESCE(SUM(quantity * price_cents), 0) AS stock_value_cents
            FROM products
            "#,
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(summary)
    }

    pub async fn category_breakdown(&self) -> LedgerResult<Vec<CategoryBreakdown>> {
        let rows = sqlx::query_as::<_, CategoryBreakdown>(
            r#"
            SELECT category,
                   COUNT(*) AS product_count,
                   COALESCE(SUM(quantity), 0) AS total_units,
                   COALESCE(SUM(quantity * price_cents), 0) AS stock_value_cents
            FROM products
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    /// Sales and returns per day or month, oldest bucket first.
    ///
    /// Buckets are UTC calendar days/months. Empty buckets are omitted.
    pub async fn revenue_by_period(
        &self,
        bucket: Bucket,
        range: DateRange,
    ) -> LedgerResult<Vec<RevenueBucket>> {
        let rows = sqlx::query_as::<_, RevenueBucket>(
            r#"
            SELECT COALESCE(strftime(?1, created_at), '') AS period,
                   COALESCE(SUM(CASE WHEN kind = 'SALE' THEN total_cents END), 0) AS sales_cents,
                   COALESCE(SUM(CASE WHEN kind = 'RETURN' THEN total_cents END), 0) AS returns_cents,
                   COALESCE(SUM(total_cents), 0) AS net_cents,
                   COUNT(*) AS batch_count
            FROM ledger_batches
            WHERE kind IN ('SALE', 'RETURN')
              AND (?2 IS NULL OR julianday(created_at) >= julianday(?2))
              AND (?3 IS NULL OR julianday(created_at) < julianday(?3))
            GROUP BY period
            ORDER BY period
            "#,
        )
        .bind(bucket.strftime_pattern())
        .bind(range.from)
        .bind(range.to)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    pub async fn sales_summary(&self, range: DateRange) -> LedgerResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT COALESCE(SUM(kind = 'SALE'), 0) AS sale_count,
                   COALESCE(SUM(kind = 'RETURN'), 0) AS return_count,
                   COALESCE(SUM(CASE WHEN kind = 'SALE' THEN total_cents END), 0) AS gross_sales_cents,
                   COALESCE(SUM(CASE WHEN kind = 'RETURN' THEN total_cents END), 0) AS returns_cents,
                   COALESCE(SUM(total_cents), 0) AS net_cents
            FROM ledger_batches
            WHERE kind IN ('SALE', 'RETURN')
              AND (?1 IS NULL OR julianday(created_at) >= julianday(?1))
              AND (?2 IS NULL OR julianday(created_at) < julianday(?2))
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(self.db.pool())
        .await?;

        Ok(summary)
    }

    /// Best sellers by net units (sales minus returns).
    pub async fn top_selling(&self, limit: u32, range: DateRange) -> LedgerResult<Vec<TopSeller>> {
        let rows = sqlx::query_as::<_, TopSeller>(
            r#"
            SELECT l.product_code AS product_code,
                   MAX(l.name_snapshot) AS name,
                   SUM(l.quantity) AS units_sold,
                   SUM(l.line_total_cents) AS revenue_cents
            FROM batch_lines l
            JOIN ledger_batches b ON b.id = l.batch_id
            WHERE b.kind IN ('SALE', 'RETURN')
              AND (?1 IS NULL OR julianday(b.created_at) >= julianday(?1))
              AND (?2 IS NULL OR julianday(b.created_at) < julianday(?2))
            GROUP BY l.product_code
            HAVING SUM(l.quantity) > 0
            ORDER BY units_sold DESC, revenue_cents DESC, l.product_code
            LIMIT ?3
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::StockLedger;
    use crate::DbConfig;
    use chrono::{Duration, Utc};
    use stockledger_core::{LineItem, NewProduct};

    async fn seeded() -> StockLedger {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = StockLedger::new(db, LedgerConfig::default());

        for (code, name, price, qty, category) in [
            ("P1", "Widget", 100_00, 10, "Tools"),
            ("P2", "Gadget", 5_00, 3, "Tools"),
            ("D1", "Cola", 2_00, 40, "Drinks"),
        ] {
            ledger
                .add_product(NewProduct::new(code, name, price, qty, category))
                .await
                .unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn test_catalog_queries() {
        let ledger = seeded().await;
        let reports = ledger.reports();

        assert_eq!(reports.get_product("P1").await.unwrap().quantity, 10);
        assert_eq!(
            reports.get_product("NOPE").await.unwrap_err().code(),
            crate::ledger::ErrorCode::NotFound
        );

        let names: Vec<String> = reports
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Cola", "Gadget", "Widget"]);

        assert!(reports.check_availability("P1", 10).await.unwrap());
        assert!(!reports.check_availability("P1", 11).await.unwrap());
        assert!(reports.check_availability("NOPE", 1).await.is_err());
        assert!(reports.check_availability("P1", 0).await.is_err());

        let low = reports.low_stock(None).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].code, "P2");
        assert_eq!(reports.low_stock(Some(10)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_inventory_and_categories() {
        let ledger = seeded().await;
        let reports = ledger.reports();

        let summary = reports.inventory_summary().await.unwrap();
        assert_eq!(summary.product_count, 3);
        assert_eq!(summary.total_units, 53);
        assert_eq!(summary.stock_value_cents, 10 * 100_00 + 3 * 5_00 + 40 * 2_00);

        let categories = reports.category_breakdown().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "Drinks");
        assert_eq!(categories[1].product_count, 2);
        assert_eq!(categories[1].total_units, 13);
    }

    #[tokio::test]
    async fn test_sales_aggregates() {
        let ledger = seeded().await;

        ledger
            .apply_batch(
                vec![LineItem::new("P1", 2, 100_00), LineItem::new("D1", 10, 2_00)],
                BatchKind::Sale,
            )
            .await
            .unwrap();
        ledger
            .apply_batch(vec![LineItem::new("D1", 5, 2_00)], BatchKind::Sale)
            .await
            .unwrap();
        ledger
            .apply_batch(vec![LineItem::new("P1", 1, 100_00)], BatchKind::Return)
            .await
            .unwrap();

        let reports = ledger.reports();

        let summary = reports.sales_summary(DateRange::all()).await.unwrap();
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.return_count, 1);
        assert_eq!(summary.gross_sales_cents, 220_00 + 10_00);
        assert_eq!(summary.returns_cents, -100_00);
        assert_eq!(summary.net_cents, 130_00);

        let buckets = reports
            .revenue_by_period(Bucket::Day, DateRange::all())
            .await
            .unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].period, Utc::now().format("%Y-%m-%d").to_string());
        assert_eq!(buckets[0].batch_count, 3);
        assert_eq!(buckets[0].net_cents, 130_00);

        let future = DateRange::between(Utc::now() + Duration::days(1), Utc::now() + Duration::days(2));
        assert!(reports
            .revenue_by_period(Bucket::Month, future)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(reports.sales_summary(future).await.unwrap().sale_count, 0);

        let top = reports.top_selling(10, DateRange::all()).await.unwrap();
        assert_eq!(top[0].product_code, "D1");
        assert_eq!(top[0].units_sold, 15);
        assert_eq!(top[1].product_code, "P1");
        assert_eq!(top[1].units_sold, 1);
        assert_eq!(top[1].revenue_cents, 100_00);

        assert_eq!(reports.list_batches(Some(BatchKind::Sale), 10).await.unwrap().len(), 2);
        assert_eq!(reports.list_batches(None, 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reconcile_balanced_after_activity() {
        let ledger = seeded().await;
        ledger
            .apply_batch(vec![LineItem::new("P2", 3, 5_00)], BatchKind::Sale)
            .await
            .unwrap();

        let rows = ledger.reports().reconcile().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.is_balanced()), "{rows:?}");
    }
}
