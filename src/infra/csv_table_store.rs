use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use tracing::debug;

use crate::app::ports::TableStore;
use crate::domain::Table;
use crate::error::Result;

/// CSV-backed implementation of the `TableStore` port.
///
/// Reads are flexible: ragged rows are padded or truncated to the header width
/// so one malformed line does not fail a whole dataset.
pub struct CsvTableStore;

impl CsvTableStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvTableStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStore for CsvTableStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_table(&self, path: &Path) -> Result<Table> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(str::to_string).collect());
        }

        debug!(path = %path.display(), rows = table.len(), "read table");
        Ok(table)
    }

    fn write_table(&self, path: &Path, table: &Table) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(table.headers())?;
        for row in table.rows() {
            writer.write_record(row)?;
        }
        writer.flush()?;

        debug!(path = %path.display(), rows = table.len(), "wrote table");
        Ok(())
    }
}
