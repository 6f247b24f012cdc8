//! Configuration management and validation.
//!
//! Provides the extraction configuration: where logs are found, how the
//! dataset is written, which feature columns are excluded, and how much
//! detail validation reports carry.

use crate::constants::{
    DEFAULT_LOG_EXTENSION, IPC_EXTENSIONS, MAX_LISTED_NEGATIVE_FILES, MAX_REPORTED_FILES,
    MAX_SAMPLE_ROWS, PARQUET_EXTENSIONS, SOURCE_FILE_COLUMN, TARGET_COLUMN,
};
use crate::error::{ExtractError, Result};
use polars::prelude::{IpcCompression, ParquetCompression};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// Supported compression algorithms for dataset files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_parquet_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }

    /// Convert to polars IpcCompression type.
    ///
    /// Arrow IPC only carries LZ4 or ZSTD buffers; Snappy falls back to LZ4.
    pub fn to_ipc_compression(&self) -> Option<IpcCompression> {
        match self {
            CompressionAlgorithm::Lz4 => Some(IpcCompression::LZ4),
            CompressionAlgorithm::Uncompressed => None,
            CompressionAlgorithm::Snappy | CompressionAlgorithm::Zstd => {
                warn!("{:?} is not used for Arrow IPC output, writing LZ4 instead", self);
                Some(IpcCompression::LZ4)
            }
        }
    }
}

impl Default for CompressionAlgorithm {
    fn default() -> Self {
        CompressionAlgorithm::Lz4
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            _ => Err(ExtractError::UnknownCompression {
                name: s.to_string(),
            }),
        }
    }
}

/// Columnar file formats the exporter can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Parquet,
    /// Arrow IPC, also known as Feather v2
    Ipc,
}

impl OutputFormat {
    /// Pick the format from the output file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| ExtractError::UnsupportedOutputFormat {
                path: path.to_path_buf(),
            })?;

        if PARQUET_EXTENSIONS.contains(&extension.as_str()) {
            Ok(OutputFormat::Parquet)
        } else if IPC_EXTENSIONS.contains(&extension.as_str()) {
            Ok(OutputFormat::Ipc)
        } else {
            Err(ExtractError::UnsupportedOutputFormat {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Limits applied when rendering diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportLimits {
    /// Problematic files listed in a validation failure
    pub max_reported_files: usize,
    /// Offending rows shown as a sample
    pub max_sample_rows: usize,
    /// Negative-target files listed by name before switching to a count
    pub max_listed_negative_files: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            max_reported_files: MAX_REPORTED_FILES,
            max_sample_rows: MAX_SAMPLE_ROWS,
            max_listed_negative_files: MAX_LISTED_NEGATIVE_FILES,
        }
    }
}

/// Global configuration for log extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Extension of the log files to scan (without the dot)
    pub log_extension: String,

    /// Descend into subdirectories of the input directory
    pub recursive: bool,

    /// Only scan the first N log files (sorted by path)
    pub max_files: Option<usize>,

    /// Maximum number of files scanned concurrently
    pub max_concurrent_files: usize,

    /// Compression codec for the written dataset
    pub compression: CompressionAlgorithm,

    /// Feature columns dropped while assembling the dataset
    pub excluded_columns: Vec<String>,

    /// Column holding the training target
    pub target_column: String,

    /// Validate and report, but do not write the dataset
    pub validate_only: bool,

    /// Show progress bars while scanning and merging
    pub show_progress: bool,

    /// Diagnostic report limits
    pub report_limits: ReportLimits,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            log_extension: DEFAULT_LOG_EXTENSION.to_string(),
            recursive: false,
            max_files: None,
            max_concurrent_files: num_cpus::get().max(1),
            compression: CompressionAlgorithm::default(),
            excluded_columns: Vec::new(),
            target_column: TARGET_COLUMN.to_string(),
            validate_only: false,
            show_progress: true,
            report_limits: ReportLimits::default(),
        }
    }
}

impl ExtractConfig {
    /// Set the log file extension
    pub fn with_log_extension(mut self, extension: impl Into<String>) -> Self {
        self.log_extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Enable recursive discovery
    pub fn with_recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Limit the number of scanned files
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = Some(max_files);
        self
    }

    /// Set maximum concurrent file scans
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    /// Set the output compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Exclude feature columns from the dataset
    pub fn with_excluded_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Enable validate-only mode
    pub fn with_validate_only(mut self) -> Self {
        self.validate_only = true;
        self
    }

    /// Disable progress bars
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Check the configuration for values the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.log_extension.is_empty() {
            return Err(ExtractError::Configuration {
                message: "log file extension must not be empty".to_string(),
            });
        }

        if self.max_concurrent_files == 0 {
            return Err(ExtractError::Configuration {
                message: "max_concurrent_files must be at least 1".to_string(),
            });
        }

        if self.max_files == Some(0) {
            return Err(ExtractError::Configuration {
                message: "max_files must be at least 1".to_string(),
            });
        }

        if self.target_column.is_empty() {
            return Err(ExtractError::Configuration {
                message: "target column name must not be empty".to_string(),
            });
        }

        for column in &self.excluded_columns {
            if column == SOURCE_FILE_COLUMN || *column == self.target_column {
                return Err(ExtractError::Configuration {
                    message: format!("column '{}' cannot be excluded", column),
                });
            }
        }

        Ok(())
    }
}
