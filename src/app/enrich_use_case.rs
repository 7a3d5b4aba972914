use anyhow::Result;
use tracing::info;

use crate::app::ports::TableStore;
use crate::config::PipelineConfig;
use crate::domain::Table;
use crate::pipeline::processing::enrich::{Enricher, EnrichmentReport};

/// The gold dataset plus its enrichment accounting.
pub struct GoldOutput {
    pub table: Table,
    pub report: EnrichmentReport,
}

/// Joins the cleaned datasets, derives the text indicators and persists the
/// business-tier output.
pub struct EnrichUseCase<'a> {
    store: &'a dyn TableStore,
    config: &'a PipelineConfig,
    enricher: Enricher,
}

impl<'a> EnrichUseCase<'a> {
    pub fn new(store: &'a dyn TableStore, config: &'a PipelineConfig) -> Self {
        Self {
            store,
            config,
            enricher: Enricher::new(),
        }
    }

    pub fn run(&self, catalog: &Table, reviews: &Table) -> Result<GoldOutput> {
        let (table, report) = self.enricher.enrich(reviews, catalog)?;

        self.store
            .write_table(&self.config.dashboard_gold_path(), &table)?;
        info!(
            records = report.joined_rows,
            path = %self.config.dashboard_gold_path().display(),
            "gold dataset written"
        );

        Ok(GoldOutput { table, report })
    }
}
