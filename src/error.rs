//! Error handling for log extraction operations.
//!
//! Provides error types with context for log discovery, line selection,
//! dataset validation, and columnar export failures.

use crate::validation::ValidationReport;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Input directory not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("No .{extension} files found in {path}")]
    NoLogFiles { path: PathBuf, extension: String },

    #[error("Unsupported algorithm: {name} (expected one of FP, PDLP, CP, FJ)")]
    UnknownAlgorithm { name: String },

    #[error("Unsupported compression: {name} (expected one of snappy, zstd, lz4, none)")]
    UnknownCompression { name: String },

    #[error("Unsupported output format for file: {path}")]
    UnsupportedOutputFormat { path: PathBuf },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("{report}")]
    ValidationFailed { report: Box<ValidationReport> },

    #[error("No valid entries remaining after dropping {dropped} rows with a negative target")]
    NoValidRows { dropped: usize },

    #[error("Target column '{column}' must hold integers, found {kind} values")]
    InvalidTarget { column: String, kind: String },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl ExtractError {
    /// Wrap a validation report into the fatal validation error
    pub fn validation_failed(report: ValidationReport) -> Self {
        Self::ValidationFailed {
            report: Box::new(report),
        }
    }

    /// Whether this error came out of dataset validation rather than I/O or setup
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed { .. } | Self::NoValidRows { .. } | Self::InvalidTarget { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
