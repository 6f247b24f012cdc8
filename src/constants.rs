//! Application constants for the solver log extractor
//!
//! Tag markers, dataset column names, and reporting limits shared across
//! the selection, pairing, validation and export stages.

// =============================================================================
// Tag Markers
// =============================================================================

/// Tag markers emitted by the solver for each supported algorithm.
///
/// The trailing colon is part of the marker: it keeps ordinary debug lines
/// that merely mention an algorithm name out of the selection.
pub mod tags {
    pub const FP_FEATURES: &str = "FP_FEATURES:";
    pub const FP_RESULT: &str = "FP_RESULT:";

    pub const PDLP_FEATURES: &str = "PDLP_FEATURES:";
    pub const PDLP_RESULT: &str = "PDLP_RESULT:";

    pub const CP_FEATURES: &str = "CP_FEATURES:";
    pub const CP_RESULT: &str = "CP_RESULT:";

    /// Single-line legacy format, one complete record per line
    pub const FJ_LEGACY: &str = "FJ:";
}

// =============================================================================
// Dataset Columns
// =============================================================================

/// Column holding the base name of the log file a record came from
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Column a downstream regressor is trained to predict
pub const TARGET_COLUMN: &str = "iter";

/// Older spelling of the target column, renamed on commit
pub const TARGET_ALIAS: &str = "iterations";

// =============================================================================
// Discovery Defaults
// =============================================================================

/// Default log file extension searched in the input directory
pub const DEFAULT_LOG_EXTENSION: &str = "log";

/// Output extensions mapped to Parquet
pub const PARQUET_EXTENSIONS: &[&str] = &["parquet", "pq"];

/// Output extensions mapped to Arrow IPC (Feather v2)
pub const IPC_EXTENSIONS: &[&str] = &["feather", "arrow", "ipc"];

// =============================================================================
// Reporting Limits
// =============================================================================

/// Maximum number of problematic files listed in a validation failure
pub const MAX_REPORTED_FILES: usize = 20;

/// Number of offending rows shown as a sample in a validation failure
pub const MAX_SAMPLE_ROWS: usize = 10;

/// Negative-target files are listed by name only up to this count
pub const MAX_LISTED_NEGATIVE_FILES: usize = 10;

/// Number of features printed per line in the feature listing
pub const FEATURES_PER_LINE: usize = 3;

// =============================================================================
// Progress Display
// =============================================================================

pub mod progress {
    pub const BAR_TEMPLATE: &str =
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";
    pub const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
    pub const PROGRESS_CHARS: &str = "#>-";
}
