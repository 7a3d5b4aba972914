use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};

/// Bronze-tier input file names. These are the well-known locations upstream
/// producers drop raw exports at; they are part of the external contract.
pub const CATALOG_BRONZE_FILE: &str = "01_Meta_Bronze.csv";
pub const REVIEWS_BRONZE_FILE: &str = "01_Reviews_Bronze.csv";

/// Silver-tier audit checkpoint file names.
pub const CATALOG_SILVER_FILE: &str = "02_Meta_Silver.csv";
pub const REVIEWS_SILVER_FILE: &str = "02_Reviews_Silver.csv";

/// Gold-tier reporting output file name.
pub const DASHBOARD_GOLD_FILE: &str = "03_Dashboard_Gold.csv";

/// Explicit locations of the three data tiers, constructed once at startup and
/// passed to each stage. Stages never consult ambient filesystem state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub bronze_dir: PathBuf,
    pub silver_dir: PathBuf,
    pub gold_dir: PathBuf,
}

impl PipelineConfig {
    /// Build the tier layout under a single data root, e.g. `data/bronze`,
    /// `data/silver`, `data/gold`.
    pub fn from_data_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            bronze_dir: root.join("bronze"),
            silver_dir: root.join("silver"),
            gold_dir: root.join("gold"),
        }
    }

    /// Create the silver and gold directories. The bronze directory is owned
    /// by upstream producers and is never created here.
    pub fn ensure_output_dirs(&self) -> Result<()> {
        for dir in [&self.silver_dir, &self.gold_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                EtlError::Config(format!("cannot create output dir '{}': {}", dir.display(), e))
            })?;
        }
        Ok(())
    }

    pub fn catalog_bronze_path(&self) -> PathBuf {
        self.bronze_dir.join(CATALOG_BRONZE_FILE)
    }

    pub fn reviews_bronze_path(&self) -> PathBuf {
        self.bronze_dir.join(REVIEWS_BRONZE_FILE)
    }

    pub fn catalog_silver_path(&self) -> PathBuf {
        self.silver_dir.join(CATALOG_SILVER_FILE)
    }

    pub fn reviews_silver_path(&self) -> PathBuf {
        self.silver_dir.join(REVIEWS_SILVER_FILE)
    }

    pub fn dashboard_gold_path(&self) -> PathBuf {
        self.gold_dir.join(DASHBOARD_GOLD_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_paths_hang_off_the_data_root() {
        let config = PipelineConfig::from_data_root("data");
        assert_eq!(
            config.catalog_bronze_path(),
            PathBuf::from("data/bronze/01_Meta_Bronze.csv")
        );
        assert_eq!(
            config.dashboard_gold_path(),
            PathBuf::from("data/gold/03_Dashboard_Gold.csv")
        );
    }
}
