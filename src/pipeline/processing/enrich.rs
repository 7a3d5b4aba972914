use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::Table;
use crate::error::{EtlError, Result};

/// Join key reconciling reviews with catalog entries.
pub const JOIN_KEY: &str = "product_id";

/// Delivery-delay vocabulary, lowercased. The Spanish terms cover the second
/// language present in the review corpus.
pub const LATE_DELIVERY_KEYWORDS: [&str; 7] = [
    "late",
    "delay",
    "did not arrive",
    "lost",
    "tarde",
    "retraso",
    "slow",
];

/// Returns/refunds/defects vocabulary.
pub const RETURN_RISK_KEYWORDS: [&str; 6] =
    ["return", "refund", "back", "devolucion", "defective", "broken"];

/// Fixed reporting schema of the gold dataset. Names absent from the joined
/// table are omitted, never an error.
pub const REPORT_COLUMNS: [&str; 7] = [
    "brand",
    "price",
    "rating",
    "timestamp",
    "is_late_delivery",
    "is_return_risk",
    "product_id",
];

/// Counts reported after enrichment.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub joined_rows: usize,
    pub late_delivery_flagged: usize,
    pub return_risk_flagged: usize,
}

/// Substring containment against a keyword set over case-folded text. A
/// keyword inside a larger word still counts ("slow" also flags "slowly").
pub fn text_matches_any(text: &str, keywords: &[&str]) -> bool {
    let normalized = text.to_lowercase();
    keywords.iter().any(|keyword| normalized.contains(keyword))
}

fn indicator(text: Option<&str>, keywords: &[&str]) -> String {
    if text_matches_any(text.unwrap_or(""), keywords) {
        "1".to_string()
    } else {
        "0".to_string()
    }
}

/// Combines the cleaned datasets into the reporting-ready gold table: inner
/// join, text-derived indicators, fixed projection.
pub struct Enricher;

impl Enricher {
    pub fn new() -> Self {
        Self
    }

    /// Inner join of cleaned reviews to the cleaned catalog on `product_id`.
    /// Reviews whose product is absent from the catalog are dropped silently;
    /// only fully governed, matched records reach the business tier.
    pub fn join(&self, reviews: &Table, catalog: &Table) -> Result<Table> {
        let review_key = reviews
            .column_index(JOIN_KEY)
            .ok_or_else(|| missing_key("reviews"))?;
        let catalog_key = catalog
            .column_index(JOIN_KEY)
            .ok_or_else(|| missing_key("catalog"))?;

        // Catalog columns carried into the joined row: everything except the
        // join key and names already taken by the review side.
        let mut carried = Vec::new();
        for (index, name) in catalog.headers().iter().enumerate() {
            if index == catalog_key {
                continue;
            }
            if reviews.has_column(name) {
                warn!(column = %name, "catalog column shadowed by review column, dropped from join");
            } else {
                carried.push(index);
            }
        }

        let mut headers: Vec<String> = reviews.headers().to_vec();
        headers.extend(carried.iter().map(|&i| catalog.headers()[i].clone()));
        let mut joined = Table::new(headers);

        // First occurrence wins; the cleaned catalog is unique on the key anyway.
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        for (index, row) in catalog.rows().iter().enumerate() {
            by_id.entry(row[catalog_key].as_str()).or_insert(index);
        }

        for row in reviews.rows() {
            if let Some(&catalog_index) = by_id.get(row[review_key].as_str()) {
                let catalog_row = &catalog.rows()[catalog_index];
                let mut merged = row.clone();
                merged.extend(carried.iter().map(|&i| catalog_row[i].clone()));
                joined.push_row(merged);
            }
        }
        Ok(joined)
    }

    /// Attach `is_late_delivery` and `is_return_risk`, each a pure function of
    /// the review text. A missing or empty text column yields all zeros.
    pub fn derive_indicators(&self, joined: &mut Table) -> (usize, usize) {
        let late: Vec<String> = (0..joined.len())
            .map(|row| indicator(joined.value(row, "text"), &LATE_DELIVERY_KEYWORDS))
            .collect();
        let risk: Vec<String> = (0..joined.len())
            .map(|row| indicator(joined.value(row, "text"), &RETURN_RISK_KEYWORDS))
            .collect();

        let late_count = late.iter().filter(|v| *v == "1").count();
        let risk_count = risk.iter().filter(|v| *v == "1").count();

        joined.add_column("is_late_delivery", late);
        joined.add_column("is_return_risk", risk);
        (late_count, risk_count)
    }

    /// Project to the fixed reporting schema, omitting absent columns.
    pub fn project(&self, joined: &Table) -> Table {
        joined.select_columns(&REPORT_COLUMNS)
    }

    /// Full enrichment pass over the cleaned datasets.
    pub fn enrich(&self, reviews: &Table, catalog: &Table) -> Result<(Table, EnrichmentReport)> {
        let mut joined = self.join(reviews, catalog)?;
        let (late_delivery_flagged, return_risk_flagged) = self.derive_indicators(&mut joined);
        let gold = self.project(&joined);

        let report = EnrichmentReport {
            joined_rows: gold.len(),
            late_delivery_flagged,
            return_risk_flagged,
        };
        info!(
            joined_rows = report.joined_rows,
            late_delivery = report.late_delivery_flagged,
            return_risk = report.return_risk_flagged,
            "enrichment completed"
        );
        Ok((gold, report))
    }
}

impl Default for Enricher {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_key(dataset: &str) -> EtlError {
    EtlError::MissingColumn {
        dataset: dataset.to_string(),
        column: JOIN_KEY.to_string(),
    }
}
