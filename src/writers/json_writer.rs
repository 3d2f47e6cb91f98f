use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::DailyRow;
use crate::writers::csv_writer::{create_parent_dir, rounded};

/// Pretty-printed JSON output for rollups and comparison results.
pub struct JsonWriter;

impl JsonWriter {
    pub fn new() -> Self {
        Self
    }

    /// Daily rows rounded the same way as the CSV output.
    pub fn write_rows(&self, rows: &[DailyRow], path: &Path) -> Result<()> {
        let rounded_rows: Vec<DailyRow> = rows.iter().map(rounded).collect();
        self.write_value(&rounded_rows, path)
    }

    pub fn write_value<T: Serialize + ?Sized>(&self, value: &T, path: &Path) -> Result<()> {
        create_parent_dir(path)?;
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, value)?;

        info!(path = %path.display(), "Wrote JSON output");
        Ok(())
    }
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}
