//! Dataset writing module
//!
//! Writes a validated dataset to a compressed columnar file, Parquet or
//! Arrow IPC depending on the output extension. The file is written to a
//! temporary sibling and renamed into place, so readers never observe a
//! partially written dataset.
//!
//! Staging files are named `.<output name>.<random>.partial`. A run killed
//! mid-write (Ctrl+C exits the process without unwinding) can leave one
//! behind; the next write to the same output removes it.

use crate::config::{CompressionAlgorithm, OutputFormat};
use crate::dataset::Dataset;
use crate::error::{ExtractError, Result};
use crate::models::ExportSummary;

use polars::prelude::{
    DataFrame, IpcWriter, ParquetWriter as PolarsParquetWriter, SerWriter, StatisticsOptions,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::Builder;
use tracing::{debug, warn};

const STAGING_SUFFIX: &str = ".partial";

/// Columnar writer for extracted datasets
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    output_path: PathBuf,
    format: OutputFormat,
    compression: CompressionAlgorithm,
}

impl DatasetWriter {
    /// Create a writer; the format is taken from the output extension
    pub fn new(output_path: PathBuf, compression: CompressionAlgorithm) -> Result<Self> {
        let format = OutputFormat::from_path(&output_path)?;
        Ok(Self {
            output_path,
            format,
            compression,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write the dataset, replacing any existing file at the output path
    pub fn write(&self, dataset: &Dataset) -> Result<ExportSummary> {
        let mut df = dataset.to_dataframe()?;

        let parent = match self.output_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let prefix = self.staging_prefix();
        remove_stale_staging(&parent, &prefix);

        let mut staging = Builder::new()
            .prefix(&prefix)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&parent)?;
        debug!(
            "Writing {} rows x {} columns as {:?} ({:?}) via {}",
            df.height(),
            df.width(),
            self.format,
            self.compression,
            staging.path().display()
        );

        self.write_frame(staging.as_file_mut(), &mut df)?;
        staging.as_file().sync_all()?;

        staging
            .persist(&self.output_path)
            .map_err(|e| ExtractError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Failed to move dataset into place: {}", e.error),
            })?;

        let file_size_bytes = std::fs::metadata(&self.output_path)?.len();

        Ok(ExportSummary {
            output_path: self.output_path.clone(),
            rows: df.height(),
            columns: df.width(),
            file_size_bytes,
        })
    }

    fn staging_prefix(&self) -> String {
        let name = self
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(".{}.", name)
    }

    fn write_frame(&self, file: &mut File, df: &mut DataFrame) -> Result<()> {
        match self.format {
            OutputFormat::Parquet => {
                PolarsParquetWriter::new(file)
                    .with_compression(self.compression.to_parquet_compression())
                    .with_statistics(StatisticsOptions::full())
                    .finish(df)
                    .map_err(|e| ExtractError::ProcessingFailed {
                        path: self.output_path.clone(),
                        reason: format!("Failed to write parquet: {}", e),
                    })?;
            }
            OutputFormat::Ipc => {
                IpcWriter::new(file)
                    .with_compression(self.compression.to_ipc_compression())
                    .finish(df)
                    .map_err(|e| ExtractError::ProcessingFailed {
                        path: self.output_path.clone(),
                        reason: format!("Failed to write Arrow IPC: {}", e),
                    })?;
            }
        }
        Ok(())
    }
}

/// Delete staging files left by an interrupted write of the same output
fn remove_stale_staging(dir: &Path, prefix: &str) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !(name.starts_with(prefix) && name.ends_with(STAGING_SUFFIX)) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => debug!("Removed stale staging file {}", entry.path().display()),
            Err(e) => warn!(
                "Could not remove stale staging file {}: {}",
                entry.path().display(),
                e
            ),
        }
    }
}
