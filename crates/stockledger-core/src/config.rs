//! # Ledger Configuration
//!
//! Limits applied while validating batches, plus reporting defaults.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKLEDGER_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after the ledger is built.

use serde::{Deserialize, Serialize};

use crate::{LOW_STOCK_THRESHOLD, MAX_BATCH_LINES, MAX_LINE_QUANTITY};

/// Ledger limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Maximum line items in one batch.
    pub max_batch_lines: usize,

    /// Maximum absolute quantity on one line.
    pub max_line_quantity: i64,

    /// Default threshold for low-stock reports.
    pub low_stock_threshold: i64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            max_batch_lines: MAX_BATCH_LINES,
            max_line_quantity: MAX_LINE_QUANTITY,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
        }
    }
}

impl LedgerConfig {
    /// Creates a LedgerConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `STOCKLEDGER_MAX_BATCH_LINES`
    /// - `STOCKLEDGER_MAX_LINE_QUANTITY`
    /// - `STOCKLEDGER_LOW_STOCK_THRESHOLD`
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LedgerConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = LedgerConfig::default();

        if let Some(value) = lookup("STOCKLEDGER_MAX_BATCH_LINES").and_then(|v| v.parse().ok()) {
            config.max_batch_lines = value;
        }

        if let Some(value) = lookup("STOCKLEDGER_MAX_LINE_QUANTITY").and_then(|v| v.parse().ok()) {
            config.max_line_quantity = value;
        }

        if let Some(value) =
            lookup("STOCKLEDGER_LOW_STOCK_THRESHOLD").and_then(|v| v.parse().ok())
        {
            config.low_stock_threshold = value;
        }

        config
    }

    pub fn max_batch_lines(mut self, max: usize) -> Self {
        self.max_batch_lines = max;
        self
    }

    pub fn max_line_quantity(mut self, max: i64) -> Self {
        self.max_line_quantity = max;
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.max_batch_lines, 100);
        assert_eq!(config.max_line_quantity, 9_999);
        assert_eq!(config.low_stock_threshold, 5);
    }

    #[test]
    fn test_from_lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = [
            ("STOCKLEDGER_MAX_BATCH_LINES", "10"),
            ("STOCKLEDGER_MAX_LINE_QUANTITY", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = LedgerConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.max_batch_lines, 10);
        assert_eq!(config.max_line_quantity, 9_999);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LedgerConfig = serde_json::from_str(r#"{"lowStockThreshold": 2}"#).unwrap();
        assert_eq!(config.low_stock_threshold, 2);
        assert_eq!(config.max_batch_lines, 100);
    }
}
