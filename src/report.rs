//! Console reporting for extraction runs.
//!
//! Everything here prints to stdout with `colored` headings; machine-facing
//! diagnostics go through `tracing` instead. The summaries are computed by
//! plain functions so they can be tested without capturing output.

use crate::constants::{FEATURES_PER_LINE, SOURCE_FILE_COLUMN};
use crate::dataset::Dataset;
use crate::models::{Algorithm, ExportSummary, NoDataReason, Record, ScalarValue};
use crate::validation::{IssueKind, NegativeTargetSummary, ValidationReport};
use colored::*;
use std::collections::BTreeSet;
use std::path::Path;

/// Min, max and mean of the target over all records
#[derive(Debug, Clone, PartialEq)]
pub struct TargetStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summary of the records produced by pairing or legacy parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSummary {
    pub total_records: usize,
    pub unique_files: usize,
    pub average_per_file: f64,
    /// Only present when every record carries a numeric target
    pub target: Option<TargetStats>,
    /// Fields of the first record, in key order
    pub sample_fields: Vec<(String, ScalarValue)>,
}

impl ExtractionSummary {
    pub fn from_records(records: &[Record], target_column: &str) -> Self {
        let unique_files: BTreeSet<&str> =
            records.iter().map(|r| r.source_file.as_str()).collect();

        let average_per_file = if unique_files.is_empty() {
            0.0
        } else {
            records.len() as f64 / unique_files.len() as f64
        };

        let targets: Option<Vec<f64>> = records
            .iter()
            .map(|r| r.get(target_column).and_then(ScalarValue::as_f64))
            .collect();

        let target = targets.filter(|v| !v.is_empty()).map(|values| {
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            TargetStats { min, max, mean }
        });

        let sample_fields = records
            .first()
            .map(|r| {
                r.fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            total_records: records.len(),
            unique_files: unique_files.len(),
            average_per_file,
            target,
            sample_fields,
        }
    }
}

/// Columns grouped by role for the post-validation listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureListing {
    pub metadata: Vec<String>,
    pub target: Option<String>,
    pub features: Vec<String>,
}

impl FeatureListing {
    pub fn from_dataset(dataset: &Dataset, target_column: &str) -> Self {
        let mut metadata = Vec::new();
        let mut target = None;
        let mut features = Vec::new();

        for name in dataset.column_names() {
            if name == SOURCE_FILE_COLUMN {
                metadata.push(name.to_string());
            } else if name == target_column {
                target = Some(name.to_string());
            } else {
                features.push(name.to_string());
            }
        }

        Self {
            metadata,
            target,
            features,
        }
    }

    /// Feature names chunked for display
    pub fn feature_rows(&self) -> impl Iterator<Item = String> + '_ {
        self.features
            .chunks(FEATURES_PER_LINE)
            .map(|chunk| chunk.join(", "))
    }
}

pub fn print_run_header(algorithm: Algorithm, input_dir: &Path, output: &Path) {
    println!(
        "{}",
        format!(
            "Extracting {} training data ({})",
            algorithm.display_name(),
            algorithm.code()
        )
        .bright_green()
        .bold()
    );
    println!("  {} {}", "Logs:".bright_cyan(), input_dir.display());
    println!("  {} {}", "Output:".bright_cyan(), output.display());
}

pub fn print_step(message: &str) {
    println!("\n{}", message.bright_yellow());
}

pub fn print_extraction_summary(summary: &ExtractionSummary, target_column: &str) {
    println!("\n{}", "Extraction Statistics".bright_cyan().bold());
    println!(
        "  {} {}",
        "Total records:".bright_cyan(),
        summary.total_records.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Unique files:".bright_cyan(),
        summary.unique_files.to_string().bright_white().bold()
    );
    println!(
        "  {} {:.1}",
        "Avg records per file:".bright_cyan(),
        summary.average_per_file
    );

    if let Some(target) = &summary.target {
        println!(
            "  {} min={} max={} mean={:.1}",
            format!("{}:", target_column).bright_cyan(),
            target.min,
            target.max,
            target.mean
        );
    }

    if !summary.sample_fields.is_empty() {
        println!("  {}", "First record:".bright_cyan());
        for (key, value) in &summary.sample_fields {
            println!("    {} = {}", key, value);
        }
    }
}

pub fn print_negative_targets(
    summary: &NegativeTargetSummary,
    target_column: &str,
    max_listed_files: usize,
) {
    println!(
        "  {} Dropped {} of {} rows ({:.2}%) with negative {}",
        "Warning:".bright_yellow().bold(),
        summary.dropped,
        summary.total,
        summary.percentage,
        target_column
    );

    if summary.files.len() <= max_listed_files {
        println!("  {}", "Affected files:".bright_cyan());
        for file in &summary.files {
            println!("    - {}", file);
        }
    } else {
        println!(
            "  {} {} files",
            "Affected files:".bright_cyan(),
            summary.files.len()
        );
    }

    println!(
        "  {} {}",
        "Rows remaining:".bright_cyan(),
        summary.remaining.to_string().bright_white().bold()
    );
}

pub fn print_feature_listing(listing: &FeatureListing) {
    println!("\n{}", "Dataset Columns".bright_cyan().bold());
    println!(
        "  {} {}",
        "Metadata:".bright_cyan(),
        listing.metadata.join(", ")
    );
    match &listing.target {
        Some(target) => println!("  {} {}", "Target:".bright_cyan(), target),
        None => println!("  {} {}", "Target:".bright_cyan(), "(absent)".bright_black()),
    }
    println!(
        "  {} {}",
        "Features:".bright_cyan(),
        listing.features.len().to_string().bright_white().bold()
    );
    for row in listing.feature_rows() {
        println!("    {}", row);
    }
}

/// Full diagnostic dump for a dataset that failed validation
pub fn print_validation_failure(report: &ValidationReport) {
    eprintln!(
        "\n{}",
        "Dataset validation failed, nothing was written"
            .bright_red()
            .bold()
    );
    eprintln!(
        "  {} of {} rows have invalid values",
        report.invalid_rows.to_string().bright_white().bold(),
        report.total_rows
    );

    for (kind, heading) in [
        (IssueKind::Missing, "Missing values:"),
        (IssueKind::NonFinite, "Non-finite values (NaN/inf):"),
    ] {
        let issues: Vec<_> = report.issues_of(kind).collect();
        if issues.is_empty() {
            continue;
        }
        eprintln!("  {}", heading.bright_cyan());
        for issue in issues {
            eprintln!(
                "    {}: {} rows ({:.2}%)",
                issue.column, issue.count, issue.percentage
            );
        }
    }

    eprintln!("  {}", "Affected files:".bright_cyan());
    for file in &report.problem_files {
        eprintln!("    {}: {} rows", file.file, file.rows);
    }
    if report.unlisted_files() > 0 {
        eprintln!("    ... and {} more files", report.unlisted_files());
    }

    if let Some(sample) = &report.sample {
        eprintln!("  {}", "Sample of invalid rows:".bright_cyan());
        eprintln!("{}", sample);
    }

    eprintln!("\n  {}", "Possible causes:".bright_yellow());
    eprintln!("    - solver runs that crashed or timed out mid-record");
    eprintln!("    - FEATURES or RESULT groups cut off before all fields were printed");
    eprintln!("    - log format drift between solver versions");
    eprintln!("  {}", "Action required:".bright_yellow());
    eprintln!("    Fix or remove the affected log files, then rerun the extraction.");
}

pub fn print_no_data(reason: NoDataReason, algorithm: Algorithm) {
    let message = match reason {
        NoDataReason::NoMatchingLines => format!(
            "No {} lines found in any log file",
            algorithm.patterns().join(" / ")
        ),
        NoDataReason::NoCompleteRecords => {
            format!("No complete {} records could be assembled", algorithm.code())
        }
    };
    println!("\n{} {}", "No data:".bright_yellow().bold(), message);
}

pub fn print_export_summary(summary: &ExportSummary) {
    println!("\n{}", "Export Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Rows:".bright_cyan(),
        summary.rows.to_string().bright_white().bold()
    );
    println!("  {} {}", "Columns:".bright_cyan(), summary.columns);
    println!(
        "  {} {:.2} MB",
        "File size:".bright_cyan(),
        summary.file_size_mb()
    );
    println!(
        "  {} {}",
        "Written to:".bright_cyan(),
        summary.output_path.display()
    );
}
