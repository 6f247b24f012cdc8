//! Solver Log Extractor Library
//!
//! Turns free-form solver logs into training datasets for iteration-count
//! predictors. Each supported algorithm prints tagged `key=value` lines
//! while it runs; this library finds those lines, reassembles multi-line
//! FEATURES/RESULT groups into records, validates the resulting table and
//! writes it as Parquet or Arrow IPC.
//!
//! ```no_run
//! use solverlog_extract::{Algorithm, ExtractConfig, LogExtractor};
//! use std::path::PathBuf;
//!
//! # async fn run() -> solverlog_extract::Result<()> {
//! let outcome = LogExtractor::new(PathBuf::from("logs"), Algorithm::FeasibilityPump, None)?
//!     .with_config(ExtractConfig::default().with_recursive())
//!     .process()
//!     .await?;
//! println!("{} rows exported", outcome.stats().rows_exported);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod validation;

pub use config::{CompressionAlgorithm, ExtractConfig, OutputFormat};
pub use dataset::Dataset;
pub use error::{ExtractError, Result};
pub use models::{
    Algorithm, ExportSummary, ExtractionOutcome, NoDataReason, ProcessingStats, Record,
    ScalarValue, Tag, TaggedLine,
};
pub use pipeline::LogExtractor;
pub use pipeline::selector::{FileLineSelector, LineSelector};
