//! Core data structures and types for solver log extraction.
//!
//! Defines the supported algorithms and their tag markers, the line and
//! value types flowing through the pipeline, completed training records,
//! and the statistics reported at the end of a run.

use crate::constants::{SOURCE_FILE_COLUMN, TARGET_ALIAS, TARGET_COLUMN, tags};
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Solver algorithms that emit predictor log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Feasibility Pump (FP_FEATURES / FP_RESULT)
    FeasibilityPump,
    /// PDLP LP solver (PDLP_FEATURES / PDLP_RESULT)
    Pdlp,
    /// Constraint Propagation (CP_FEATURES / CP_RESULT)
    ConstraintPropagation,
    /// Feasibility Jump, legacy single-line `FJ:` format
    FeasibilityJump,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::FeasibilityPump,
        Algorithm::Pdlp,
        Algorithm::ConstraintPropagation,
        Algorithm::FeasibilityJump,
    ];

    /// Short code used on the command line and in default output names
    pub fn code(&self) -> &'static str {
        match self {
            Algorithm::FeasibilityPump => "FP",
            Algorithm::Pdlp => "PDLP",
            Algorithm::ConstraintPropagation => "CP",
            Algorithm::FeasibilityJump => "FJ",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::FeasibilityPump => "Feasibility Pump",
            Algorithm::Pdlp => "LP Solver",
            Algorithm::ConstraintPropagation => "Constraint Propagation",
            Algorithm::FeasibilityJump => "Feasibility Jump",
        }
    }

    /// Whether this algorithm logs one complete record per line
    pub fn is_legacy(&self) -> bool {
        matches!(self, Algorithm::FeasibilityJump)
    }

    /// Exact marker for the given tag, if the algorithm emits that tag
    pub fn prefix(&self, tag: Tag) -> Option<&'static str> {
        match (self, tag) {
            (Algorithm::FeasibilityPump, Tag::Features) => Some(tags::FP_FEATURES),
            (Algorithm::FeasibilityPump, Tag::Result) => Some(tags::FP_RESULT),
            (Algorithm::Pdlp, Tag::Features) => Some(tags::PDLP_FEATURES),
            (Algorithm::Pdlp, Tag::Result) => Some(tags::PDLP_RESULT),
            (Algorithm::ConstraintPropagation, Tag::Features) => Some(tags::CP_FEATURES),
            (Algorithm::ConstraintPropagation, Tag::Result) => Some(tags::CP_RESULT),
            (Algorithm::FeasibilityJump, Tag::Legacy) => Some(tags::FJ_LEGACY),
            _ => None,
        }
    }

    /// Literal patterns handed to the line selector
    pub fn patterns(&self) -> Vec<&'static str> {
        if self.is_legacy() {
            vec![tags::FJ_LEGACY]
        } else {
            [Tag::Features, Tag::Result]
                .into_iter()
                .filter_map(|tag| self.prefix(tag))
                .collect()
        }
    }

    /// Assign a tag to a selected line. FEATURES wins when both markers appear.
    pub fn classify(&self, content: &str) -> Option<Tag> {
        let candidates: &[Tag] = if self.is_legacy() {
            &[Tag::Legacy]
        } else {
            &[Tag::Features, Tag::Result]
        };

        candidates.iter().copied().find(|tag| {
            self.prefix(*tag)
                .is_some_and(|prefix| content.contains(prefix))
        })
    }

    /// Default output file name, e.g. `fp_data.parquet`
    pub fn default_output_name(&self) -> String {
        format!("{}_data.parquet", self.code().to_lowercase())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Algorithm {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|alg| alg.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ExtractError::UnknownAlgorithm {
                name: s.to_string(),
            })
    }
}

/// Semantic role of a selected log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Features,
    Result,
    Legacy,
}

/// Raw line returned by a line selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedLine {
    pub source_file: PathBuf,
    /// 1-based line number within `source_file`
    pub line_number: usize,
    pub content: String,
}

/// Selected line with its tag resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedLine {
    pub source_file: PathBuf,
    pub line_number: usize,
    pub tag: Tag,
    pub payload: String,
}

impl TaggedLine {
    pub fn new(
        source_file: impl Into<PathBuf>,
        line_number: usize,
        tag: Tag,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            line_number,
            tag,
            payload: payload.into(),
        }
    }
}

/// Typed value parsed from a `key=value` token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Integer(i64),
    Float(f64),
    String(String),
}

impl ScalarValue {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ScalarValue::String(_))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Integer(v) => Some(*v as f64),
            ScalarValue::Float(v) => Some(*v),
            ScalarValue::String(_) => None,
        }
    }

    /// Non-finite floats are the values dataset validation rejects
    pub fn is_finite(&self) -> bool {
        match self {
            ScalarValue::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Integer(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::String(v) => f.write_str(v),
        }
    }
}

/// Field name to value mapping. Keys are unique; merging is last-write-wins.
pub type FieldMap = BTreeMap<String, ScalarValue>;

/// One completed training example
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Base name of the originating log file
    pub source_file: String,
    pub fields: FieldMap,
}

impl Record {
    /// Build a record, normalising the target column name.
    ///
    /// `iterations` is renamed to `iter` unless `iter` is already present.
    /// A payload field named like the source column is discarded so the
    /// record's own file attribution is the only one exported.
    pub fn new(source_file: impl Into<String>, mut fields: FieldMap) -> Self {
        fields.remove(SOURCE_FILE_COLUMN);

        if !fields.contains_key(TARGET_COLUMN) {
            if let Some(value) = fields.remove(TARGET_ALIAS) {
                fields.insert(TARGET_COLUMN.to_string(), value);
            }
        }

        Self {
            source_file: source_file.into(),
            fields,
        }
    }

    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.fields.get(column)
    }

    /// Number of fields, including the source file column
    pub fn width(&self) -> usize {
        self.fields.len() + 1
    }
}

/// Display name of a log file: its base name, or the full path if it has none
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Why a run finished without producing a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    /// No line in any file contained the algorithm's markers
    NoMatchingLines,
    /// Lines matched, but none formed a complete record
    NoCompleteRecords,
}

/// Summary of a written dataset file
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub output_path: PathBuf,
    pub rows: usize,
    pub columns: usize,
    pub file_size_bytes: u64,
}

impl ExportSummary {
    pub fn file_size_mb(&self) -> f64 {
        self.file_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub files_scanned: usize,
    /// Files skipped because they could not be read
    pub files_failed: usize,
    pub lines_matched: usize,
    pub records_extracted: usize,
    pub rows_dropped: usize,
    pub rows_exported: usize,
    pub processing_time_ms: u128,
}

/// Terminal state of a successful run
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// Dataset validated and written
    Exported {
        summary: ExportSummary,
        stats: ProcessingStats,
    },
    /// Dataset validated; writing was skipped on request
    Validated { stats: ProcessingStats },
    /// Nothing to export
    NoData {
        reason: NoDataReason,
        stats: ProcessingStats,
    },
}

impl ExtractionOutcome {
    pub fn stats(&self) -> &ProcessingStats {
        match self {
            ExtractionOutcome::Exported { stats, .. }
            | ExtractionOutcome::Validated { stats }
            | ExtractionOutcome::NoData { stats, .. } => stats,
        }
    }

    /// Process exit code for the binary: no data is distinct from failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ExtractionOutcome::Exported { .. } | ExtractionOutcome::Validated { .. } => 0,
            ExtractionOutcome::NoData { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_from_str_is_case_insensitive() {
        assert_eq!(
            "fp".parse::<Algorithm>().unwrap(),
            Algorithm::FeasibilityPump
        );
        assert_eq!("PDLP".parse::<Algorithm>().unwrap(), Algorithm::Pdlp);
        assert_eq!(
            " Cp ".parse::<Algorithm>().unwrap(),
            Algorithm::ConstraintPropagation
        );
        assert!(matches!(
            "BB".parse::<Algorithm>(),
            Err(ExtractError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn test_patterns_per_algorithm() {
        assert_eq!(
            Algorithm::Pdlp.patterns(),
            vec!["PDLP_FEATURES:", "PDLP_RESULT:"]
        );
        assert_eq!(Algorithm::FeasibilityJump.patterns(), vec!["FJ:"]);
        assert_eq!(Algorithm::FeasibilityPump.prefix(Tag::Legacy), None);
    }

    #[test]
    fn test_classify_requires_colon_terminated_marker() {
        let alg = Algorithm::FeasibilityPump;
        assert_eq!(alg.classify("FP_FEATURES: n=1"), Some(Tag::Features));
        assert_eq!(alg.classify("[t=1.2] FP_RESULT: iter=4"), Some(Tag::Result));
        assert_eq!(alg.classify("FP_FEATURES n=1"), None);
        assert_eq!(alg.classify("FP round 3 done"), None);
        // FEATURES marker takes precedence when both appear
        assert_eq!(
            alg.classify("FP_RESULT: FP_FEATURES: x=1"),
            Some(Tag::Features)
        );
    }

    #[test]
    fn test_record_renames_iterations() {
        let mut fields = FieldMap::new();
        fields.insert("iterations".to_string(), ScalarValue::Integer(7));
        let record = Record::new("a.log", fields);
        assert_eq!(record.get("iter"), Some(&ScalarValue::Integer(7)));
        assert!(record.get("iterations").is_none());
    }

    #[test]
    fn test_record_keeps_existing_iter() {
        let mut fields = FieldMap::new();
        fields.insert("iter".to_string(), ScalarValue::Integer(7));
        fields.insert("iterations".to_string(), ScalarValue::Integer(9));
        let record = Record::new("a.log", fields);
        assert_eq!(record.get("iter"), Some(&ScalarValue::Integer(7)));
        assert_eq!(record.get("iterations"), Some(&ScalarValue::Integer(9)));
    }

    #[test]
    fn test_record_drops_payload_source_file() {
        let mut fields = FieldMap::new();
        fields.insert(
            SOURCE_FILE_COLUMN.to_string(),
            ScalarValue::String("spoofed".to_string()),
        );
        fields.insert("n".to_string(), ScalarValue::Integer(1));
        let record = Record::new("real.log", fields);
        assert_eq!(record.source_file, "real.log");
        assert_eq!(record.width(), 2);
    }

    #[test]
    fn test_source_name_uses_base_name() {
        assert_eq!(source_name(Path::new("/tmp/logs/run_1.log")), "run_1.log");
    }
}
