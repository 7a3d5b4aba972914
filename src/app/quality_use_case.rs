use anyhow::Result;
use tracing::info;

use crate::app::ports::TableStore;
use crate::config::PipelineConfig;
use crate::pipeline::ingestion::RawDatasets;
use crate::pipeline::processing::quality_gate::{GateResult, QualityGate};

/// Cleaned datasets plus their per-rule accounting.
pub struct SilverOutput {
    pub catalog: GateResult,
    pub reviews: GateResult,
}

/// Runs both governance gates and persists the silver audit checkpoint.
pub struct QualityUseCase<'a> {
    store: &'a dyn TableStore,
    config: &'a PipelineConfig,
    catalog_gate: QualityGate,
    review_gate: QualityGate,
}

impl<'a> QualityUseCase<'a> {
    pub fn new(store: &'a dyn TableStore, config: &'a PipelineConfig) -> Self {
        Self {
            store,
            config,
            catalog_gate: QualityGate::catalog(),
            review_gate: QualityGate::reviews(),
        }
    }

    /// Clean both raw datasets independently, then write the silver tier for
    /// inspection and audit before enrichment runs.
    pub fn run(&self, raw: &RawDatasets) -> Result<SilverOutput> {
        let catalog = self.catalog_gate.apply(&raw.catalog)?;
        let reviews = self.review_gate.apply(&raw.reviews)?;

        self.store
            .write_table(&self.config.catalog_silver_path(), &catalog.table)?;
        self.store
            .write_table(&self.config.reviews_silver_path(), &reviews.table)?;
        info!(
            catalog_rows = catalog.rows_out,
            review_rows = reviews.rows_out,
            silver_dir = %self.config.silver_dir.display(),
            "silver checkpoint written"
        );

        Ok(SilverOutput { catalog, reviews })
    }
}
