//! # Batch Planning
//!
//! The Validate step of the ledger engine, as a pure function.
//!
//! ## How A Batch Is Planned
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LineItem[] + kind + snapshots (stock read inside the unit of work)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  batch size      ── 0 lines? → EmptyBatch                              │
//! │       │                                                                 │
//! │       ▼  for each line, in order                                       │
//! │  known code?     ── no → NotFound { line }                             │
//! │  quantity rule   ── sale/return > 0, adjustment ≠ 0 → InvalidLine      │
//! │  price rule      ── sale/return > 0, adjustment ≥ 0 → InvalidLine      │
//! │  projected stock ── projected + delta < 0 → InsufficientStock          │
//! │       │             (projected already includes earlier lines with     │
//! │       │              the same code)                                    │
//! │       ▼                                                                 │
//! │  BatchPlan { lines with delta + expected stock_after, total }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is written while planning, so any error here leaves the
//! catalog untouched.

use std::collections::HashMap;

use crate::config::LedgerConfig;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{BatchKind, Direction, LineItem, Movement, Product};
use crate::validation::{
    validate_adjustment_delta, validate_adjustment_price, validate_batch_size,
    validate_line_quantity, validate_unit_price,
};

fn overflow(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: i64::MIN,
        max: i64::MAX,
    }
}

/// Stock state of one product as seen by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockSnapshot {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
}

impl From<&Product> for StockSnapshot {
    fn from(product: &Product) -> Self {
        StockSnapshot {
            product_id: product.id.clone(),
            code: product.code.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            quantity: product.quantity,
        }
    }
}

/// A validated line with its computed effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLine {
    /// 1-based position in the submitted batch.
    pub line_no: usize,
    pub product_id: String,
    pub product_code: String,
    pub name: String,
    pub category: String,
    /// Signed change to stock.
    pub delta: i64,
    /// Stock after this line, counting earlier lines of the batch.
    pub stock_after: i64,
    /// Quantity stored on the batch line (negative for returns).
    pub recorded_quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
    pub customer: Option<String>,
    pub note: Option<String>,
}

impl PlannedLine {
    pub fn direction(&self) -> Direction {
        Direction::from_delta(self.delta)
    }
}

/// The full effect of a batch, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub kind: BatchKind,
    pub lines: Vec<PlannedLine>,
    pub total_cents: i64,
}

impl BatchPlan {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Net stock change per product code.
    pub fn net_deltas(&self) -> HashMap<&str, i64> {
        let mut net: HashMap<&str, i64> = HashMap::new();
        for line in &self.lines {
            *net.entry(line.product_code.as_str()).or_default() += line.delta;
        }
        net
    }
}

/// Validates a batch and computes its deltas.
///
/// `snapshots` maps product code to its current stock. Lines sharing a
/// code are applied one after another against the running projection.
///
/// ## Example
/// ```rust
/// use std::collections::HashMap;
/// use stockledger_core::{plan_batch, BatchKind, LedgerConfig, LineItem, StockSnapshot};
///
/// let mut stock = HashMap::new();
/// stock.insert("P1".to_string(), StockSnapshot {
///     product_id: "p1-id".into(),
///     code: "P1".into(),
///     name: "Widget".into(),
///     category: "Tools".into(),
///     quantity: 10,
/// });
///
/// let plan = plan_batch(
///     BatchKind::Sale,
///     &[LineItem::new("P1", 3, 100_00)],
///     &LedgerConfig::default(),
///     &stock,
/// ).unwrap();
///
/// assert_eq!(plan.lines[0].delta, -3);
/// assert_eq!(plan.lines[0].stock_after, 7);
/// assert_eq!(plan.total_cents, 300_00);
/// ```
pub fn plan_batch(
    kind: BatchKind,
    items: &[LineItem],
    config: &LedgerConfig,
    snapshots: &HashMap<String, StockSnapshot>,
) -> CoreResult<BatchPlan> {
    validate_batch_size(items.len(), config.max_batch_lines)?;

    let mut projected: HashMap<&str, i64> = HashMap::new();
    let mut lines = Vec::with_capacity(items.len());
    let mut total = Money::zero();

    for (index, item) in items.iter().enumerate() {
        let line_no = index + 1;
        let code = item.product_code.as_str();

        let snapshot = snapshots.get(code).ok_or_else(|| CoreError::NotFound {
            entity: "Product".to_string(),
            id: code.to_string(),
            line: Some(line_no),
        })?;

        let invalid = |reason| CoreError::InvalidLine {
            line: line_no,
            code: code.to_string(),
            reason,
        };

        match kind {
            BatchKind::Sale | BatchKind::Return => {
                validate_line_quantity(item.quantity, config.max_line_quantity)
                    .map_err(invalid)?;
                validate_unit_price(item.unit_price_cents).map_err(invalid)?;
            }
            BatchKind::Adjustment => {
                validate_adjustment_delta(item.quantity, config.max_line_quantity)
                    .map_err(invalid)?;
                validate_adjustment_price(item.unit_price_cents).map_err(invalid)?;
            }
        }

        let available = *projected.get(code).unwrap_or(&snapshot.quantity);
        let delta = kind.stock_delta(item.quantity);
        let stock_after = available
            .checked_add(delta)
            .ok_or_else(|| invalid(overflow("stock")))?;

        if stock_after < 0 {
            return Err(CoreError::InsufficientStock {
                line: line_no,
                code: code.to_string(),
                requested: -delta,
                available,
            });
        }
        projected.insert(code, stock_after);

        let recorded_quantity = kind.recorded_quantity(item.quantity);
        let line_total = Money::from_cents(item.unit_price_cents)
            .checked_multiply_quantity(recorded_quantity)
            .ok_or_else(|| invalid(overflow("line total")))?;
        total = total
            .checked_add(line_total)
            .ok_or_else(|| invalid(overflow("batch total")))?;

        lines.push(PlannedLine {
            line_no,
            product_id: snapshot.product_id.clone(),
            product_code: snapshot.code.clone(),
            name: snapshot.name.clone(),
            category: snapshot.category.clone(),
            delta,
            stock_after,
            recorded_quantity,
            unit_price_cents: item.unit_price_cents,
            line_total_cents: line_total.cents(),
            customer: item.customer.clone(),
            note: item.note.clone(),
        });
    }

    Ok(BatchPlan {
        kind,
        lines,
        total_cents: total.cents(),
    })
}

// =============================================================================
// Reversal
// =============================================================================

/// Net stock effect of a batch on one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetEffect {
    pub product_id: String,
    pub product_code: String,
    pub delta: i64,
}

/// A compensating stock change for a reversed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalLine {
    pub product_id: String,
    pub product_code: String,
    /// Opposite of the batch's net effect on the product.
    pub delta: i64,
    pub stock_after: i64,
}

/// Sums movements per product, in order of first appearance.
///
/// Products whose movements cancel out are dropped.
pub fn net_effects(movements: &[Movement]) -> Vec<NetEffect> {
    let mut effects: Vec<NetEffect> = Vec::new();

    for movement in movements {
        match effects
            .iter_mut()
            .find(|e| e.product_id == movement.product_id)
        {
            Some(effect) => effect.delta += movement.signed_delta(),
            None => effects.push(NetEffect {
                product_id: movement.product_id.clone(),
                product_code: movement.product_code.clone(),
                delta: movement.signed_delta(),
            }),
        }
    }

    effects.retain(|e| e.delta != 0);
    effects
}

/// Plans the stock changes that undo a batch's movements.
///
/// Undoing a sale puts stock back; undoing a return takes it out again
/// and can fail with `InsufficientStock` if the returned units have
/// since been sold. `line` in that error is the position in the
/// returned list.
pub fn plan_reversal(
    movements: &[Movement],
    snapshots: &HashMap<String, StockSnapshot>,
) -> CoreResult<Vec<ReversalLine>> {
    net_effects(movements)
        .into_iter()
        .enumerate()
        .map(|(index, effect)| {
            let snapshot = snapshots
                .get(&effect.product_code)
                .ok_or_else(|| CoreError::product_not_found(&effect.product_code))?;

            let delta = -effect.delta;
            let stock_after = snapshot.quantity.checked_add(delta).ok_or_else(|| {
                CoreError::ConsistencyViolation {
                    code: effect.product_code.clone(),
                    quantity: snapshot.quantity,
                }
            })?;
            if stock_after < 0 {
                return Err(CoreError::InsufficientStock {
                    line: index + 1,
                    code: effect.product_code,
                    requested: -delta,
                    available: snapshot.quantity,
                });
            }

            Ok(ReversalLine {
                product_id: effect.product_id,
                product_code: effect.product_code,
                delta,
                stock_after,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn stock(entries: &[(&str, i64)]) -> HashMap<String, StockSnapshot> {
        entries
            .iter()
            .map(|(code, qty)| {
                (
                    code.to_string(),
                    StockSnapshot {
                        product_id: format!("{code}-id"),
                        code: code.to_string(),
                        name: format!("Product {code}"),
                        category: "General".to_string(),
                        quantity: *qty,
                    },
                )
            })
            .collect()
    }

    fn plan_default(
        kind: BatchKind,
        items: &[LineItem],
        snapshots: &HashMap<String, StockSnapshot>,
    ) -> CoreResult<BatchPlan> {
        plan_batch(kind, items, &LedgerConfig::default(), snapshots)
    }

    #[test]
    fn test_sale_within_stock() {
        let snapshots = stock(&[("P1", 10), ("P2", 4)]);
        let plan = plan_default(
            BatchKind::Sale,
            &[LineItem::new("P1", 3, 100_00), LineItem::new("P2", 4, 250)],
            &snapshots,
        )
        .unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].stock_after, 7);
        assert_eq!(plan.lines[1].stock_after, 0);
        assert_eq!(plan.lines[1].direction(), Direction::Out);
        assert_eq!(plan.total_cents, 300_00 + 1000);
    }

    #[test]
    fn test_selling_last_unit_is_allowed() {
        let snapshots = stock(&[("P1", 7)]);
        let plan = plan_default(BatchKind::Sale, &[LineItem::new("P1", 7, 100)], &snapshots).unwrap();
        assert_eq!(plan.lines[0].stock_after, 0);
    }

    #[test]
    fn test_insufficient_stock_reports_requested_and_available() {
        let snapshots = stock(&[("P1", 7)]);
        let err = plan_default(BatchKind::Sale, &[LineItem::new("P1", 8, 100)], &snapshots).unwrap_err();
        match err {
            CoreError::InsufficientStock {
                line,
                code,
                requested,
                available,
            } => {
                assert_eq!(line, 1);
                assert_eq!(code, "P1");
                assert_eq!(requested, 8);
                assert_eq!(available, 7);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_codes_accumulate_against_running_stock() {
        let snapshots = stock(&[("P1", 5)]);

        let ok = plan_default(
            BatchKind::Sale,
            &[LineItem::new("P1", 2, 100), LineItem::new("P1", 3, 100)],
            &snapshots,
        )
        .unwrap();
        assert_eq!(ok.lines[1].stock_after, 0);
        assert_eq!(ok.net_deltas().get("P1"), Some(&-5));

        let err = plan_default(
            BatchKind::Sale,
            &[LineItem::new("P1", 3, 100), LineItem::new("P1", 3, 100)],
            &snapshots,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                line: 2,
                requested: 3,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_failure_on_later_line_is_reported_with_its_number() {
        let snapshots = stock(&[("P1", 10), ("P2", 1)]);
        let err = plan_default(
            BatchKind::Sale,
            &[
                LineItem::new("P1", 1, 100),
                LineItem::new("P1", 1, 100),
                LineItem::new("P2", 2, 100),
            ],
            &snapshots,
        )
        .unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_empty_batch() {
        let snapshots = stock(&[]);
        assert!(matches!(
            plan_default(BatchKind::Sale, &[], &snapshots),
            Err(CoreError::EmptyBatch)
        ));
    }

    #[test]
    fn test_unknown_code() {
        let snapshots = stock(&[("P1", 1)]);
        let err = plan_default(BatchKind::Return, &[LineItem::new("NOPE", 1, 100)], &snapshots).unwrap_err();
        assert!(matches!(
            err,
            CoreError::NotFound { line: Some(1), ref id, .. } if id == "NOPE"
        ));
    }

    #[test]
    fn test_line_rules() {
        let snapshots = stock(&[("P1", 10)]);

        let err = plan_default(BatchKind::Sale, &[LineItem::new("P1", 0, 100)], &snapshots).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidLine {
                reason: ValidationError::MustBePositive { .. },
                ..
            }
        ));

        let err = plan_default(BatchKind::Sale, &[LineItem::new("P1", 1, 0)], &snapshots).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLine { .. }));

        let err = plan_default(BatchKind::Adjustment, &[LineItem::new("P1", 0, 0)], &snapshots).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidLine {
                reason: ValidationError::MustBeNonZero { .. },
                ..
            }
        ));

        let err = plan_default(
            BatchKind::Adjustment,
            &[LineItem::new("P1", 1, 0), LineItem::new("P1", 1, -5)],
            &snapshots,
        )
        .unwrap_err();
        match err {
            CoreError::InvalidLine { line, ref code, ref reason } => {
                assert_eq!(line, 2);
                assert_eq!(code, "P1");
                assert!(matches!(reason, ValidationError::OutOfRange { min: 0, .. }));
            }
            other => panic!("expected InvalidLine, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_price_is_rejected_before_totals() {
        let snapshots = stock(&[("P1", 5_000)]);
        let err = plan_default(
            BatchKind::Sale,
            &[LineItem::new("P1", 2_000, 10_000_000_000_000_000)],
            &snapshots,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidLine {
                line: 1,
                reason: ValidationError::OutOfRange { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_total_overflow_is_an_invalid_line() {
        let snapshots = stock(&[("P1", 0)]);
        let loose = LedgerConfig::default().max_line_quantity(i64::MAX);

        let err = plan_batch(
            BatchKind::Return,
            &[LineItem::new("P1", 1_000_000_000, crate::MAX_UNIT_PRICE_CENTS)],
            &loose,
            &snapshots,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidLine {
                line: 1,
                reason: ValidationError::OutOfRange { ref field, .. },
                ..
            } if field == "line total"
        ));

        let half = LineItem::new("P1", 500_000_000, crate::MAX_UNIT_PRICE_CENTS);
        let err = plan_batch(BatchKind::Return, &[half.clone(), half], &loose, &snapshots).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidLine {
                line: 2,
                reason: ValidationError::OutOfRange { ref field, .. },
                ..
            } if field == "batch total"
        ));
    }

    #[test]
    fn test_return_increases_stock_with_negative_totals() {
        let snapshots = stock(&[("P1", 0)]);
        let plan = plan_default(BatchKind::Return, &[LineItem::new("P1", 2, 500)], &snapshots).unwrap();
        assert_eq!(plan.lines[0].delta, 2);
        assert_eq!(plan.lines[0].stock_after, 2);
        assert_eq!(plan.lines[0].recorded_quantity, -2);
        assert_eq!(plan.total_cents, -1000);
    }

    #[test]
    fn test_adjustment_cannot_go_below_zero() {
        let snapshots = stock(&[("P1", 2)]);

        let ok = plan_default(BatchKind::Adjustment, &[LineItem::new("P1", -2, 0)], &snapshots).unwrap();
        assert_eq!(ok.lines[0].stock_after, 0);

        let err = plan_default(BatchKind::Adjustment, &[LineItem::new("P1", -3, 0)], &snapshots).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_batch_line_limit() {
        let snapshots = stock(&[("P1", 100)]);
        let items = vec![LineItem::new("P1", 1, 100); 3];
        let config = LedgerConfig::default().max_batch_lines(2);
        assert!(plan_batch(BatchKind::Sale, &items, &config, &snapshots).is_err());
    }

    fn movement(code: &str, direction: Direction, quantity: i64) -> Movement {
        Movement {
            id: 0,
            product_id: format!("{code}-id"),
            product_code: code.to_string(),
            direction,
            quantity,
            reference_id: "TXN-1".to_string(),
            reason: crate::types::MovementReason::Sale,
            note: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_net_effects_merge_and_drop_zero() {
        let effects = net_effects(&[
            movement("P1", Direction::Out, 2),
            movement("P2", Direction::Out, 1),
            movement("P1", Direction::Out, 3),
            movement("P2", Direction::In, 1),
        ]);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].product_code, "P1");
        assert_eq!(effects[0].delta, -5);
    }

    #[test]
    fn test_reversal_of_sale_restores_stock() {
        let snapshots = stock(&[("P1", 5)]);
        let lines = plan_reversal(&[movement("P1", Direction::Out, 3)], &snapshots).unwrap();
        assert_eq!(lines[0].delta, 3);
        assert_eq!(lines[0].stock_after, 8);
    }

    #[test]
    fn test_reversal_of_return_needs_stock() {
        let snapshots = stock(&[("P1", 1)]);
        let err = plan_reversal(&[movement("P1", Direction::In, 4)], &snapshots).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                requested: 4,
                available: 1,
                ..
            }
        ));
    }
}
