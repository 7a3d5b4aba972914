use tracing::{info, warn};

use crate::app::ports::TableStore;
use crate::config::PipelineConfig;
use crate::domain::Table;
use crate::error::Result;

/// The two raw datasets of one pipeline run.
#[derive(Debug)]
pub struct RawDatasets {
    pub catalog: Table,
    pub reviews: Table,
}

/// Loads the bronze-tier inputs.
///
/// A missing file is signalled as `Ok(None)` so the driver can halt the run
/// cleanly; a file that exists but cannot be read is a real error.
pub struct BronzeLoader<'a> {
    store: &'a dyn TableStore,
    config: &'a PipelineConfig,
}

impl<'a> BronzeLoader<'a> {
    pub fn new(store: &'a dyn TableStore, config: &'a PipelineConfig) -> Self {
        Self { store, config }
    }

    pub fn load(&self) -> Result<Option<RawDatasets>> {
        let catalog_path = self.config.catalog_bronze_path();
        let reviews_path = self.config.reviews_bronze_path();

        if !self.store.exists(&catalog_path) || !self.store.exists(&reviews_path) {
            warn!(
                catalog = %catalog_path.display(),
                reviews = %reviews_path.display(),
                "bronze input missing, halting pipeline"
            );
            return Ok(None);
        }

        let catalog = self.store.read_table(&catalog_path)?;
        let reviews = self.store.read_table(&reviews_path)?;
        info!(records = catalog.len(), "catalog loaded");
        info!(records = reviews.len(), "reviews loaded");

        Ok(Some(RawDatasets { catalog, reviews }))
    }
}
