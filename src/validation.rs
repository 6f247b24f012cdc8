//! Dataset validation before export.
//!
//! Three checks run in order: every row must carry every column, numeric
//! columns must be finite, and the target must be non-negative. The first
//! two are fatal and produce a [`ValidationReport`]; negative targets are
//! dropped with a [`NegativeTargetSummary`].

use crate::config::ReportLimits;
use crate::constants::SOURCE_FILE_COLUMN;
use crate::dataset::{ColumnKind, Dataset};
use crate::error::{ExtractError, Result};
use crate::models::ScalarValue;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Kind of defect found in a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Row has no value for the column
    Missing,
    /// NaN or infinite value in a numeric column
    NonFinite,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::Missing => f.write_str("missing"),
            IssueKind::NonFinite => f.write_str("non-finite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnIssue {
    pub column: String,
    pub kind: IssueKind,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIssue {
    pub file: String,
    pub rows: usize,
}

/// Diagnostics for a dataset that must not be exported
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub total_rows: usize,
    pub column_issues: Vec<ColumnIssue>,
    /// Number of rows with at least one issue
    pub invalid_rows: usize,
    /// Affected files in name order, truncated to the report limit
    pub problem_files: Vec<FileIssue>,
    /// Number of affected files before truncation
    pub total_problem_files: usize,
    /// First offending rows, limited to `source_file` and the bad columns
    pub sample: Option<DataFrame>,
}

impl ValidationReport {
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &ColumnIssue> {
        self.column_issues.iter().filter(move |i| i.kind == kind)
    }

    /// Files beyond the listed ones
    pub fn unlisted_files(&self) -> usize {
        self.total_problem_files
            .saturating_sub(self.problem_files.len())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid data detected: {} of {} rows affected ({} columns with missing values, {} with non-finite values) across {} files",
            self.invalid_rows,
            self.total_rows,
            self.issues_of(IssueKind::Missing).count(),
            self.issues_of(IssueKind::NonFinite).count(),
            self.total_problem_files
        )
    }
}

/// Rows dropped because of a negative target value
#[derive(Debug, Clone, PartialEq)]
pub struct NegativeTargetSummary {
    pub dropped: usize,
    pub total: usize,
    pub percentage: f64,
    /// Affected files, sorted and unique
    pub files: Vec<String>,
    pub remaining: usize,
}

/// Validated dataset ready for export
#[derive(Debug)]
pub struct ValidationOutcome {
    pub dataset: Dataset,
    pub negative_targets: Option<NegativeTargetSummary>,
    /// False when the dataset has no target column at all
    pub target_present: bool,
}

/// Validator for assembled datasets
#[derive(Debug, Clone)]
pub struct DatasetValidator {
    target_column: String,
    limits: ReportLimits,
}

impl DatasetValidator {
    pub fn new(target_column: impl Into<String>, limits: ReportLimits) -> Self {
        Self {
            target_column: target_column.into(),
            limits,
        }
    }

    /// Run all checks, consuming the dataset
    pub fn validate(&self, mut dataset: Dataset) -> Result<ValidationOutcome> {
        if let Some(report) = self.check_values(&dataset) {
            return Err(ExtractError::validation_failed(report));
        }
        debug!("No missing or non-finite values in {} rows", dataset.len());

        let Some(target) = dataset.column(&self.target_column).cloned() else {
            warn!(
                "Target column '{}' not present; skipping target checks",
                self.target_column
            );
            return Ok(ValidationOutcome {
                dataset,
                negative_targets: None,
                target_present: false,
            });
        };

        if target.kind != ColumnKind::Integer {
            return Err(ExtractError::InvalidTarget {
                column: target.name,
                kind: target.kind.name().to_string(),
            });
        }

        let negative_targets = self.drop_negative_targets(&mut dataset)?;

        Ok(ValidationOutcome {
            dataset,
            negative_targets,
            target_present: true,
        })
    }

    /// Completeness and finiteness checks. Returns a report when either fails.
    fn check_values(&self, dataset: &Dataset) -> Option<ValidationReport> {
        let total_rows = dataset.len();
        let records = dataset.records();
        let mut bad_rows = vec![false; total_rows];
        let mut missing = Vec::new();
        let mut non_finite = Vec::new();

        for spec in dataset.columns() {
            if spec.name == SOURCE_FILE_COLUMN {
                continue;
            }

            let mut missing_count = 0;
            let mut non_finite_count = 0;
            for (row, record) in records.iter().enumerate() {
                match record.get(&spec.name) {
                    None => {
                        missing_count += 1;
                        bad_rows[row] = true;
                    }
                    Some(value) if spec.kind.is_numeric() && !value.is_finite() => {
                        non_finite_count += 1;
                        bad_rows[row] = true;
                    }
                    Some(_) => {}
                }
            }

            if missing_count > 0 {
                missing.push(column_issue(&spec.name, IssueKind::Missing, missing_count, total_rows));
            }
            if non_finite_count > 0 {
                non_finite.push(column_issue(
                    &spec.name,
                    IssueKind::NonFinite,
                    non_finite_count,
                    total_rows,
                ));
            }
        }

        if missing.is_empty() && non_finite.is_empty() {
            return None;
        }

        let column_issues: Vec<ColumnIssue> = missing.into_iter().chain(non_finite).collect();
        let bad_indices: Vec<usize> = bad_rows
            .iter()
            .enumerate()
            .filter_map(|(i, bad)| bad.then_some(i))
            .collect();

        let mut per_file: BTreeMap<&str, usize> = BTreeMap::new();
        for &row in &bad_indices {
            *per_file.entry(records[row].source_file.as_str()).or_insert(0) += 1;
        }
        let total_problem_files = per_file.len();
        let problem_files = per_file
            .into_iter()
            .take(self.limits.max_reported_files)
            .map(|(file, rows)| FileIssue {
                file: file.to_string(),
                rows,
            })
            .collect();

        let mut sample_columns = vec![SOURCE_FILE_COLUMN];
        for issue in &column_issues {
            if !sample_columns.contains(&issue.column.as_str()) {
                sample_columns.push(issue.column.as_str());
            }
        }
        let sample_rows: Vec<usize> = bad_indices
            .iter()
            .copied()
            .take(self.limits.max_sample_rows)
            .collect();
        let sample = match dataset.frame_for_rows(&sample_rows, &sample_columns) {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!("Could not build sample frame for validation report: {}", e);
                None
            }
        };

        Some(ValidationReport {
            total_rows,
            column_issues,
            invalid_rows: bad_indices.len(),
            problem_files,
            total_problem_files,
            sample,
        })
    }

    fn drop_negative_targets(&self, dataset: &mut Dataset) -> Result<Option<NegativeTargetSummary>> {
        let target = self.target_column.as_str();
        let is_negative = |value: Option<&ScalarValue>| {
            value
                .and_then(ScalarValue::as_f64)
                .is_some_and(|v| v < 0.0)
        };

        let total = dataset.len();
        let mut files: Vec<String> = dataset
            .records()
            .iter()
            .filter(|r| is_negative(r.get(target)))
            .map(|r| r.source_file.clone())
            .collect();
        let dropped = files.len();

        if dropped == 0 {
            return Ok(None);
        }

        files.sort();
        files.dedup();

        dataset.retain(|r| !is_negative(r.get(target)));
        let remaining = dataset.len();

        warn!(
            "Dropped {} rows with negative '{}' from {} files",
            dropped,
            target,
            files.len()
        );

        if remaining == 0 {
            return Err(ExtractError::NoValidRows { dropped });
        }

        Ok(Some(NegativeTargetSummary {
            dropped,
            total,
            percentage: percentage(dropped, total),
            files,
            remaining,
        }))
    }
}

fn column_issue(column: &str, kind: IssueKind, count: usize, total: usize) -> ColumnIssue {
    ColumnIssue {
        column: column.to_string(),
        kind,
        count,
        percentage: percentage(count, total),
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldMap, Record};

    fn record(file: &str, fields: &[(&str, ScalarValue)]) -> Record {
        let map: FieldMap = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Record::new(file, map)
    }

    fn validator() -> DatasetValidator {
        DatasetValidator::new("iter", ReportLimits::default())
    }

    fn clean_row(file: &str, iter: i64) -> Record {
        record(
            file,
            &[
                ("n_vars", ScalarValue::Integer(10)),
                ("density", ScalarValue::Float(0.1)),
                ("iter", ScalarValue::Integer(iter)),
            ],
        )
    }

    #[test]
    fn test_clean_dataset_passes_unchanged() {
        let dataset = Dataset::from_records(vec![clean_row("a.log", 3), clean_row("b.log", 0)], &[]);
        let outcome = validator().validate(dataset).unwrap();
        assert_eq!(outcome.dataset.len(), 2);
        assert!(outcome.negative_targets.is_none());
        assert!(outcome.target_present);
    }

    #[test]
    fn test_non_finite_value_is_fatal_with_file_attribution() {
        let mut bad = clean_row("broken.log", 5);
        bad.fields
            .insert("density".to_string(), ScalarValue::Float(f64::INFINITY));
        let dataset = Dataset::from_records(vec![clean_row("a.log", 3), bad], &[]);

        let err = validator().validate(dataset).unwrap_err();
        let ExtractError::ValidationFailed { report } = err else {
            panic!("expected validation failure");
        };
        assert_eq!(report.invalid_rows, 1);
        assert_eq!(report.total_problem_files, 1);
        assert_eq!(report.problem_files[0].file, "broken.log");
        assert_eq!(report.column_issues.len(), 1);
        assert_eq!(report.column_issues[0].column, "density");
        assert_eq!(report.column_issues[0].kind, IssueKind::NonFinite);
        assert_eq!(report.column_issues[0].percentage, 50.0);
        assert_eq!(report.sample.as_ref().map(|df| df.height()), Some(1));
    }

    #[test]
    fn test_nan_counts_as_non_finite() {
        let mut bad = clean_row("nan.log", 5);
        bad.fields
            .insert("density".to_string(), ScalarValue::Float(f64::NAN));
        let dataset = Dataset::from_records(vec![bad], &[]);
        let err = validator().validate(dataset).unwrap_err();
        assert!(err.is_validation_failure());
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let partial = record("partial.log", &[("n_vars", ScalarValue::Integer(1))]);
        let dataset = Dataset::from_records(vec![clean_row("a.log", 3), partial], &[]);

        let Err(ExtractError::ValidationFailed { report }) = validator().validate(dataset) else {
            panic!("expected validation failure");
        };
        let missing: Vec<_> = report.issues_of(IssueKind::Missing).collect();
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().all(|i| i.count == 1));
        assert_eq!(report.problem_files[0].file, "partial.log");
        assert_eq!(report.problem_files[0].rows, 1);
    }

    #[test]
    fn test_infinite_text_in_string_column_is_not_checked() {
        let dataset = Dataset::from_records(
            vec![
                record(
                    "a.log",
                    &[
                        ("status", ScalarValue::Float(f64::INFINITY)),
                        ("iter", ScalarValue::Integer(1)),
                    ],
                ),
                record(
                    "b.log",
                    &[
                        ("status", ScalarValue::String("timeout".into())),
                        ("iter", ScalarValue::Integer(1)),
                    ],
                ),
            ],
            &[],
        );
        assert!(validator().validate(dataset).is_ok());
    }

    #[test]
    fn test_problem_files_are_truncated() {
        let rows: Vec<Record> = (0..25)
            .map(|i| record(&format!("f{:02}.log", i), &[("x", ScalarValue::Float(f64::NAN))]))
            .collect();
        let dataset = Dataset::from_records(rows, &[]);
        let Err(ExtractError::ValidationFailed { report }) = validator().validate(dataset) else {
            panic!("expected validation failure");
        };
        assert_eq!(report.problem_files.len(), 20);
        assert_eq!(report.total_problem_files, 25);
        assert_eq!(report.unlisted_files(), 5);
        assert_eq!(report.sample.as_ref().map(|df| df.height()), Some(10));
    }

    #[test]
    fn test_negative_targets_are_dropped() {
        let mut rows: Vec<Record> = (0..8).map(|i| clean_row(&format!("ok{}.log", i), i)).collect();
        rows.push(clean_row("neg_a.log", -1));
        rows.push(clean_row("neg_b.log", -7));
        let dataset = Dataset::from_records(rows, &[]);

        let outcome = validator().validate(dataset).unwrap();
        assert_eq!(outcome.dataset.len(), 8);
        let summary = outcome.negative_targets.unwrap();
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.percentage, 20.0);
        assert_eq!(summary.files, vec!["neg_a.log", "neg_b.log"]);
        assert_eq!(summary.remaining, 8);
    }

    #[test]
    fn test_all_negative_targets_is_fatal() {
        let dataset = Dataset::from_records(vec![clean_row("a.log", -1), clean_row("b.log", -2)], &[]);
        assert!(matches!(
            validator().validate(dataset),
            Err(ExtractError::NoValidRows { dropped: 2 })
        ));
    }

    #[test]
    fn test_float_target_is_rejected() {
        let dataset = Dataset::from_records(
            vec![record("a.log", &[("iter", ScalarValue::Float(2.5))])],
            &[],
        );
        assert!(matches!(
            validator().validate(dataset),
            Err(ExtractError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_missing_target_column_is_tolerated() {
        let dataset = Dataset::from_records(
            vec![record("a.log", &[("n_vars", ScalarValue::Integer(1))])],
            &[],
        );
        let outcome = validator().validate(dataset).unwrap();
        assert!(!outcome.target_present);
        assert_eq!(outcome.dataset.len(), 1);
    }
}
