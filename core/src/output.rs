//! JSON and CSV writers for the accumulated table.
//!
//! Both writers return the written path or a `WriteError`; neither ever
//! touches the table. Without an explicit path, files land in the
//! configured output directory as `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`.

use crate::{
    config::PipelineConfig,
    error::WriteError,
    types::AccumulatedTable,
};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

pub struct OutputWriter {
    output_dir:  PathBuf,
    file_prefix: String,
}

impl OutputWriter {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            output_dir:  config.output_dir.clone(),
            file_prefix: config.file_prefix.clone(),
        }
    }

    /// Write the table as a pretty-printed JSON array.
    pub fn write_structured(
        &self,
        table: &AccumulatedTable,
        path: Option<&Path>,
    ) -> Result<PathBuf, WriteError> {
        if table.is_empty() {
            return Err(WriteError::EmptyTable);
        }
        let path = self.resolve(path, "json")?;
        log::info!("Saving JSON to {}", path.display());

        // Encode fully before touching the file so a bad value leaves no
        // half-written output behind.
        let encoded = serde_json::to_vec_pretty(table.rows())?;
        fs::write(&path, encoded).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;

        report_written(&path, table.len());
        Ok(path)
    }

    /// Write the table as comma-separated text with a header row.
    pub fn write_tabular(
        &self,
        table: &AccumulatedTable,
        path: Option<&Path>,
    ) -> Result<PathBuf, WriteError> {
        if table.is_empty() {
            return Err(WriteError::EmptyTable);
        }
        let path = self.resolve(path, "csv")?;
        log::info!("Saving CSV to {}", path.display());

        let mut writer = csv::Writer::from_writer(Vec::new());
        for row in table.rows() {
            writer.serialize(row)?;
        }
        let encoded = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        fs::write(&path, encoded).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;

        report_written(&path, table.len());
        Ok(path)
    }

    /// Write both formats to default paths. Each failure is logged and
    /// reported as `None` without affecting the other format.
    pub fn write_both(&self, table: &AccumulatedTable) -> (Option<PathBuf>, Option<PathBuf>) {
        let json = self
            .write_structured(table, None)
            .map_err(|e| log::error!("JSON output failed: {e}"))
            .ok();
        let csv = self
            .write_tabular(table, None)
            .map_err(|e| log::error!("CSV output failed: {e}"))
            .ok();
        (json, csv)
    }

    fn resolve(&self, path: Option<&Path>, extension: &str) -> Result<PathBuf, WriteError> {
        if let Some(p) = path {
            return Ok(p.to_path_buf());
        }
        fs::create_dir_all(&self.output_dir).map_err(|source| WriteError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;
        Ok(self.output_dir.join(default_file_name(&self.file_prefix, extension)))
    }
}

/// `<prefix>_<YYYYMMDD_HHMMSS>.<extension>` stamped with the local time.
pub fn default_file_name(prefix: &str, extension: &str) -> String {
    format!("{prefix}_{}.{extension}", Local::now().format("%Y%m%d_%H%M%S"))
}

fn report_written(path: &Path, records: usize) {
    let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    log::info!("Saved {} ({size} bytes, {records} records)", path.display());
}
