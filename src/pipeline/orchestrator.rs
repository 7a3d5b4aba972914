use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::app::enrich_use_case::EnrichUseCase;
use crate::app::ports::TableStore;
use crate::app::quality_use_case::QualityUseCase;
use crate::config::PipelineConfig;
use crate::pipeline::ingestion::BronzeLoader;
use crate::pipeline::processing::enrich::EnrichmentReport;
use crate::pipeline::processing::quality_gate::RuleReport;

/// Terminal outcome of one pipeline run. Both variants are clean exits; a
/// missing bronze input is a halt, not a crash.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// All three stages ran; the gold dataset is on disk.
    Completed(RunReport),
    /// A required bronze input was absent; no later stage was invoked.
    HaltedMissingInput,
}

/// Counts for the whole run, emitted as a single JSON log line on completion.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub catalog_rows_in: usize,
    pub catalog_rows_out: usize,
    pub catalog_rules: Vec<RuleReport>,
    pub review_rows_in: usize,
    pub review_rows_out: usize,
    pub review_rules: Vec<RuleReport>,
    pub enrichment: EnrichmentReport,
}

/// Sequences loader, quality engine and enrichment engine, short-circuiting
/// when the loader signals a missing input. Each stage fully materializes its
/// output before the next one starts.
pub struct PipelineOrchestrator<'a> {
    store: &'a dyn TableStore,
    config: &'a PipelineConfig,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(store: &'a dyn TableStore, config: &'a PipelineConfig) -> Self {
        Self { store, config }
    }

    pub fn run(&self) -> Result<PipelineOutcome> {
        let started_at = Utc::now();
        info!(bronze_dir = %self.config.bronze_dir.display(), "pipeline run starting");

        let loader = BronzeLoader::new(self.store, self.config);
        let Some(raw) = loader.load()? else {
            return Ok(PipelineOutcome::HaltedMissingInput);
        };

        let silver = QualityUseCase::new(self.store, self.config).run(&raw)?;
        let gold = EnrichUseCase::new(self.store, self.config)
            .run(&silver.catalog.table, &silver.reviews.table)?;

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            catalog_rows_in: silver.catalog.rows_in,
            catalog_rows_out: silver.catalog.rows_out,
            catalog_rules: silver.catalog.rule_reports.clone(),
            review_rows_in: silver.reviews.rows_in,
            review_rows_out: silver.reviews.rows_out,
            review_rules: silver.reviews.rule_reports.clone(),
            enrichment: gold.report.clone(),
        };
        info!(report = %serde_json::to_string(&report)?, "pipeline run completed");

        Ok(PipelineOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::CsvTableStore;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn run_halts_cleanly_without_bronze_inputs() -> Result<()> {
        let dir = tempdir()?;
        let config = PipelineConfig::from_data_root(dir.path());
        let store = CsvTableStore::new();

        let outcome = PipelineOrchestrator::new(&store, &config).run()?;
        assert!(matches!(outcome, PipelineOutcome::HaltedMissingInput));
        // No later stage ran
        assert!(!config.catalog_silver_path().exists());
        assert!(!config.dashboard_gold_path().exists());
        Ok(())
    }

    #[test]
    fn run_produces_report_with_stage_counts() -> Result<()> {
        let dir = tempdir()?;
        let config = PipelineConfig::from_data_root(dir.path());
        fs::create_dir_all(&config.bronze_dir)?;
        fs::write(
            config.catalog_bronze_path(),
            "product_id,price,brand\nP1,10.0,Acme\nP1,10.0,Acme\n",
        )?;
        fs::write(
            config.reviews_bronze_path(),
            "product_id,text,timestamp,verified_purchase,rating\n\
             P1,was late,t1,true,2\n\
             P1,was late,t1,true,2\n",
        )?;

        let store = CsvTableStore::new();
        let outcome = PipelineOrchestrator::new(&store, &config).run()?;

        let PipelineOutcome::Completed(report) = outcome else {
            panic!("expected completed outcome");
        };
        assert_eq!(report.catalog_rows_in, 2);
        assert_eq!(report.catalog_rows_out, 1);
        assert_eq!(report.review_rows_out, 1);
        assert_eq!(report.enrichment.joined_rows, 1);
        assert_eq!(report.enrichment.late_delivery_flagged, 1);
        Ok(())
    }
}
