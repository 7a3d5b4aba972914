use std::path::Path;

use crate::domain::Table;
use crate::error::Result;

/// Port for reading and writing tabular datasets at tier locations.
///
/// The pipeline stages only see this trait; the concrete on-disk format is an
/// infrastructure concern.
pub trait TableStore {
    fn exists(&self, path: &Path) -> bool;

    /// Read a dataset with a header row, preserving column names and row order.
    fn read_table(&self, path: &Path) -> Result<Table>;

    /// Write a dataset, header row first. Creates parent directories as needed
    /// and flushes before returning.
    fn write_table(&self, path: &Path, table: &Table) -> Result<()>;
}
