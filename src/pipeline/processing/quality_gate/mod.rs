use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::Table;
use crate::error::{EtlError, Result};

/// Declared column expectations for a dataset entering its gate, validated
/// once at gate entry instead of ad-hoc presence checks inside each rule.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

pub const CATALOG_SCHEMA: DatasetSchema = DatasetSchema {
    name: "catalog",
    required: &["product_id", "price"],
    optional: &["brand"],
};

pub const REVIEWS_SCHEMA: DatasetSchema = DatasetSchema {
    name: "reviews",
    required: &["product_id", "verified_purchase"],
    optional: &["text", "timestamp", "rating"],
};

impl DatasetSchema {
    /// A missing REQUIRED column is a typed error; missing optional columns
    /// only degrade the operations that would have used them.
    pub fn validate(&self, table: &Table) -> Result<()> {
        for column in self.required {
            if !table.has_column(column) {
                return Err(EtlError::MissingColumn {
                    dataset: self.name.to_string(),
                    column: column.to_string(),
                });
            }
        }
        for column in self.optional {
            if !table.has_column(column) {
                debug!(dataset = self.name, column = *column, "optional column absent");
            }
        }
        Ok(())
    }
}

/// Outcome of one governance rule: the surviving rows plus the removal count,
/// measured against the rows this rule received.
pub struct RuleOutcome {
    pub table: Table,
    pub removed: usize,
}

/// A deterministic filter or dedup step enforcing one data-quality invariant.
/// Rules are total: unexpected values are rejected rows, never errors.
pub trait GovernanceRule {
    fn name(&self) -> &'static str;
    fn apply(&self, table: &Table) -> RuleOutcome;
}

/// Keep the first-seen row per key. Input row order defines "first": bronze
/// files are the system of record for arrival order and no re-sort is applied.
/// Key columns absent from the table are excluded from the grouping key; with
/// no usable key column at all, nothing is removed.
fn dedup_keep_first(table: &Table, key_columns: &[&str]) -> RuleOutcome {
    let key_indices: Vec<usize> = key_columns
        .iter()
        .filter_map(|column| table.column_index(column))
        .collect();
    if key_indices.is_empty() {
        return RuleOutcome {
            table: table.clone(),
            removed: 0,
        };
    }

    let mut seen: HashSet<Vec<&str>> = HashSet::new();
    let mut kept = Table::new(table.headers().to_vec());
    let mut removed = 0;
    for row in table.rows() {
        let key: Vec<&str> = key_indices.iter().map(|&i| row[i].as_str()).collect();
        if seen.insert(key) {
            kept.push_row(row.clone());
        } else {
            removed += 1;
        }
    }
    RuleOutcome {
        table: kept,
        removed,
    }
}

/// Identity deduplication of the catalog: one row per `product_id`.
pub struct IdentityDedup;

impl GovernanceRule for IdentityDedup {
    fn name(&self) -> &'static str {
        "identity_dedup"
    }

    fn apply(&self, table: &Table) -> RuleOutcome {
        dedup_keep_first(table, &["product_id"])
    }
}

/// Numeric coercion with a null-on-failure contract: unparsable input maps to
/// `None`, never to an error.
pub fn coerce_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Business rule: a catalog row survives only with a price strictly greater
/// than zero. Null, zero and negative prices are rejected.
pub struct PriceValidity;

impl GovernanceRule for PriceValidity {
    fn name(&self) -> &'static str {
        "price_validity"
    }

    fn apply(&self, table: &Table) -> RuleOutcome {
        let Some(price_index) = table.column_index("price") else {
            return RuleOutcome {
                table: table.clone(),
                removed: 0,
            };
        };

        let mut kept = Table::new(table.headers().to_vec());
        let mut removed = 0;
        for row in table.rows() {
            match coerce_price(&row[price_index]) {
                Some(price) if price > 0.0 => kept.push_row(row.clone()),
                _ => removed += 1,
            }
        }
        RuleOutcome {
            table: kept,
            removed,
        }
    }
}

/// Columns forming the technical dedup key for reviews. Only the subset
/// present in the input participates.
pub const REVIEW_DEDUP_KEY: [&str; 3] = ["product_id", "text", "timestamp"];

/// Technical deduplication of reviews: same product, same text, same time is
/// one submission, however often it was ingested.
pub struct TechnicalDedup;

impl GovernanceRule for TechnicalDedup {
    fn name(&self) -> &'static str {
        "technical_dedup"
    }

    fn apply(&self, table: &Table) -> RuleOutcome {
        dedup_keep_first(table, &REVIEW_DEDUP_KEY)
    }
}

/// Boolean normalization for `verified_purchase`: trimmed, case-insensitive
/// `"true"` or `"1"`. Every other encoding counts as unverified.
pub fn parse_verified(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.eq_ignore_ascii_case("true") || trimmed == "1"
}

/// Origin-integrity rule: only verified purchases reach the silver tier.
pub struct VerifiedPurchase;

impl GovernanceRule for VerifiedPurchase {
    fn name(&self) -> &'static str {
        "verified_purchase"
    }

    fn apply(&self, table: &Table) -> RuleOutcome {
        let Some(verified_index) = table.column_index("verified_purchase") else {
            return RuleOutcome {
                table: table.clone(),
                removed: 0,
            };
        };

        let mut kept = Table::new(table.headers().to_vec());
        let mut removed = 0;
        for row in table.rows() {
            if parse_verified(&row[verified_index]) {
                kept.push_row(row.clone());
            } else {
                removed += 1;
            }
        }
        RuleOutcome {
            table: kept,
            removed,
        }
    }
}

/// Removal count of a single governance rule, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    pub rule: String,
    pub removed: usize,
}

/// A dataset after its gate, with per-rule accounting.
#[derive(Debug)]
pub struct GateResult {
    pub table: Table,
    pub rows_in: usize,
    pub rows_out: usize,
    pub rule_reports: Vec<RuleReport>,
}

/// An ordered set of governance rules applied to one dataset.
pub struct QualityGate {
    schema: DatasetSchema,
    rules: Vec<Box<dyn GovernanceRule>>,
}

impl QualityGate {
    /// Catalog gate: identity dedup, then price validity.
    pub fn catalog() -> Self {
        Self {
            schema: CATALOG_SCHEMA,
            rules: vec![Box::new(IdentityDedup), Box::new(PriceValidity)],
        }
    }

    /// Review gate: technical dedup, then the verified-purchase filter.
    pub fn reviews() -> Self {
        Self {
            schema: REVIEWS_SCHEMA,
            rules: vec![Box::new(TechnicalDedup), Box::new(VerifiedPurchase)],
        }
    }

    /// Apply every rule in declaration order. Each removal count is measured
    /// against the rows that rule received, so the second rule of a gate
    /// reports post-dedup numbers.
    pub fn apply(&self, input: &Table) -> Result<GateResult> {
        self.schema.validate(input)?;

        let rows_in = input.len();
        let mut current = input.clone();
        let mut rule_reports = Vec::new();
        for rule in &self.rules {
            let outcome = rule.apply(&current);
            info!(
                dataset = self.schema.name,
                rule = rule.name(),
                removed = outcome.removed,
                remaining = outcome.table.len(),
                "governance rule applied"
            );
            rule_reports.push(RuleReport {
                rule: rule.name().to_string(),
                removed: outcome.removed,
            });
            current = outcome.table;
        }

        Ok(GateResult {
            rows_in,
            rows_out: current.len(),
            table: current,
            rule_reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_table(rows: &[(&str, &str, &str)]) -> Table {
        let mut table = Table::new(vec![
            "product_id".to_string(),
            "price".to_string(),
            "brand".to_string(),
        ]);
        for (id, price, brand) in rows {
            table.push_row(vec![id.to_string(), price.to_string(), brand.to_string()]);
        }
        table
    }

    fn review_table(rows: &[(&str, &str, &str, &str)]) -> Table {
        let mut table = Table::new(vec![
            "product_id".to_string(),
            "text".to_string(),
            "timestamp".to_string(),
            "verified_purchase".to_string(),
        ]);
        for (id, text, ts, verified) in rows {
            table.push_row(vec![
                id.to_string(),
                text.to_string(),
                ts.to_string(),
                verified.to_string(),
            ]);
        }
        table
    }

    #[test]
    fn identity_dedup_keeps_first_seen_row() {
        let table = catalog_table(&[
            ("P1", "10.0", "Acme"),
            ("P2", "20.0", "Other"),
            ("P1", "99.0", "Imposter"),
        ]);

        let outcome = IdentityDedup.apply(&table);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.table.len(), 2);
        assert_eq!(outcome.table.value(0, "brand"), Some("Acme"));
    }

    #[test]
    fn identity_dedup_is_idempotent() {
        let table = catalog_table(&[("P1", "10.0", "Acme"), ("P1", "11.0", "Acme")]);

        let first = IdentityDedup.apply(&table);
        assert_eq!(first.removed, 1);

        let second = IdentityDedup.apply(&first.table);
        assert_eq!(second.removed, 0);
        assert_eq!(second.table.len(), first.table.len());
    }

    #[test]
    fn price_validity_rejects_null_zero_and_negative() {
        let table = catalog_table(&[
            ("P1", "19.99", "Acme"),
            ("P2", "0", "Acme"),
            ("P3", "-5.0", "Acme"),
            ("P4", "abc", "Acme"),
            ("P5", "", "Acme"),
        ]);

        let outcome = PriceValidity.apply(&table);
        assert_eq!(outcome.removed, 4);
        assert_eq!(outcome.table.len(), 1);
        assert_eq!(outcome.table.value(0, "product_id"), Some("P1"));
    }

    #[test]
    fn coerce_price_maps_unparsable_to_none() {
        assert_eq!(coerce_price("19.99"), Some(19.99));
        assert_eq!(coerce_price("  7 "), Some(7.0));
        assert_eq!(coerce_price("abc"), None);
        assert_eq!(coerce_price(""), None);
    }

    #[test]
    fn cleaned_catalog_holds_uniqueness_and_price_invariants() {
        let table = catalog_table(&[
            ("P1", "10.0", "Acme"),
            ("P1", "10.0", "Acme"),
            ("P2", "free", "Acme"),
            ("P3", "3.5", "Acme"),
        ]);

        let result = QualityGate::catalog().apply(&table).unwrap();

        let mut ids = HashSet::new();
        for row in 0..result.table.len() {
            let id = result.table.value(row, "product_id").unwrap();
            assert!(ids.insert(id.to_string()), "duplicate product_id survived");
            let price = coerce_price(result.table.value(row, "price").unwrap());
            assert!(matches!(price, Some(p) if p > 0.0));
        }
        assert_eq!(result.rows_in, 4);
        assert_eq!(result.rows_out, 2);
    }

    // Keep-first is deliberately order-sensitive: a duplicate with an
    // unparsable price shadows a later valid one, and the product drops out
    // entirely at the price rule.
    #[test]
    fn unparsable_duplicate_first_eliminates_the_product() {
        let table = catalog_table(&[("P1", "abc", "Acme"), ("P1", "19.99", "Acme")]);

        let result = QualityGate::catalog().apply(&table).unwrap();

        assert_eq!(result.rows_out, 0);
        assert_eq!(result.rule_reports[0].removed, 1); // identity_dedup
        assert_eq!(result.rule_reports[1].removed, 1); // price_validity, post-dedup
    }

    #[test]
    fn technical_dedup_uses_full_key() {
        let table = review_table(&[
            ("P1", "great", "2024-01-01", "true"),
            ("P1", "great", "2024-01-01", "true"),
            ("P1", "great", "2024-01-02", "true"),
        ]);

        let outcome = TechnicalDedup.apply(&table);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.table.len(), 2);
    }

    #[test]
    fn technical_dedup_degrades_to_present_key_subset() {
        // No timestamp column: the key collapses to (product_id, text).
        let mut table = Table::new(vec![
            "product_id".to_string(),
            "text".to_string(),
            "verified_purchase".to_string(),
        ]);
        table.push_row(vec!["P1".to_string(), "great".to_string(), "true".to_string()]);
        table.push_row(vec!["P1".to_string(), "great".to_string(), "true".to_string()]);
        table.push_row(vec!["P1".to_string(), "other".to_string(), "true".to_string()]);

        let outcome = TechnicalDedup.apply(&table);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.table.len(), 2);
    }

    #[test]
    fn dedup_with_no_key_columns_removes_nothing() {
        let mut table = Table::new(vec!["other".to_string()]);
        table.push_row(vec!["x".to_string()]);
        table.push_row(vec!["x".to_string()]);

        let outcome = dedup_keep_first(&table, &["product_id", "text", "timestamp"]);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.table.len(), 2);
    }

    #[test]
    fn verified_purchase_normalizes_true_like_encodings() {
        assert!(parse_verified("true"));
        assert!(parse_verified("True"));
        assert!(parse_verified("TRUE"));
        assert!(parse_verified(" 1 "));
        assert!(!parse_verified("false"));
        assert!(!parse_verified("yes"));
        assert!(!parse_verified("0"));
        assert!(!parse_verified(""));
    }

    #[test]
    fn review_gate_keeps_only_verified_rows() {
        let table = review_table(&[
            ("P1", "good", "t1", "true"),
            ("P2", "bad", "t2", "False"),
            ("P3", "meh", "t3", "True"),
            ("P4", "spam", "t4", "bot"),
        ]);

        let result = QualityGate::reviews().apply(&table).unwrap();

        assert_eq!(result.rows_out, 2);
        for row in 0..result.table.len() {
            assert!(parse_verified(
                result.table.value(row, "verified_purchase").unwrap()
            ));
        }
    }

    #[test]
    fn missing_required_column_is_a_typed_error() {
        let table = Table::new(vec!["price".to_string(), "brand".to_string()]);
        let err = QualityGate::catalog().apply(&table).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn { ref column, .. } if column == "product_id"));
    }
}
