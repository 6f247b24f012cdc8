//! Extraction pipeline.
//!
//! Orchestrates a complete run for one algorithm: log discovery, line
//! selection, tagging, pairing (or legacy parsing), dataset assembly and
//! validation, and export. Nothing is written unless every stage succeeds.

pub mod discovery;
pub mod legacy;
pub mod pairing;
pub mod selector;
pub mod writer;

#[cfg(test)]
mod tests;

use crate::config::ExtractConfig;
use crate::constants::progress::SPINNER_TEMPLATE;
use crate::dataset::Dataset;
use crate::error::{ExtractError, Result};
use crate::models::{
    Algorithm, ExtractionOutcome, NoDataReason, ProcessingStats, Record, SelectedLine, TaggedLine,
};
use crate::report::{self, ExtractionSummary, FeatureListing};
use crate::validation::DatasetValidator;

use self::discovery::{LogDiscovery, apply_file_limit};
use self::legacy::LegacyRecordParser;
use self::pairing::PairingEngine;
use self::selector::{FileLineSelector, LineSelector, select_lines};
use self::writer::DatasetWriter;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, info};

/// Runs the extraction pipeline for one algorithm over a log directory
#[derive(Debug, Clone)]
pub struct LogExtractor {
    input_dir: PathBuf,
    algorithm: Algorithm,
    output_path: PathBuf,
    config: ExtractConfig,
    selector: Arc<dyn LineSelector>,
}

impl LogExtractor {
    /// Create an extractor. Without an explicit output the dataset is
    /// written to `<alg>_data.parquet` in the working directory.
    pub fn new(input_dir: PathBuf, algorithm: Algorithm, output_path: Option<PathBuf>) -> Result<Self> {
        if !input_dir.is_dir() {
            return Err(ExtractError::InputNotFound { path: input_dir });
        }

        let output_path =
            output_path.unwrap_or_else(|| PathBuf::from(algorithm.default_output_name()));

        Ok(Self {
            input_dir,
            algorithm,
            output_path,
            config: ExtractConfig::default(),
            selector: Arc::new(FileLineSelector::new()),
        })
    }

    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the line selector used to scan files
    pub fn with_selector(mut self, selector: Arc<dyn LineSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Main processing entry point
    pub async fn process(&self) -> Result<ExtractionOutcome> {
        let start_time = Instant::now();
        self.config.validate()?;

        // Resolve the output format up front so a bad extension fails
        // before any log is scanned
        let writer = if self.config.validate_only {
            None
        } else {
            Some(DatasetWriter::new(
                self.output_path.clone(),
                self.config.compression,
            )?)
        };

        report::print_run_header(self.algorithm, &self.input_dir, &self.output_path);
        let mut stats = ProcessingStats::default();

        // Step 1: Discover log files
        report::print_step("Discovering log files...");
        let files = self.discover_files()?;

        // Step 2: Select tagged lines
        report::print_step("Scanning for tagged lines...");
        let patterns = self.algorithm.patterns();
        let selection = select_lines(
            Arc::clone(&self.selector),
            &files,
            &patterns,
            self.config.max_concurrent_files,
            self.config.show_progress,
        )
        .await?;

        stats.files_scanned = selection.files_scanned;
        stats.files_failed = selection.files_failed;
        stats.lines_matched = selection.lines.len();
        println!(
            "  {} {} matching lines in {} files",
            "Found".bright_green(),
            stats.lines_matched.to_string().bright_white().bold(),
            stats.files_scanned
        );

        if selection.lines.is_empty() {
            return Ok(self.no_data(NoDataReason::NoMatchingLines, stats, start_time));
        }

        // Step 3: Build records
        report::print_step("Assembling records...");
        let tagged = tag_lines(self.algorithm, selection.lines);
        let records = self.build_records(tagged).await?;
        stats.records_extracted = records.len();

        if records.is_empty() {
            return Ok(self.no_data(NoDataReason::NoCompleteRecords, stats, start_time));
        }

        report::print_extraction_summary(
            &ExtractionSummary::from_records(&records, &self.config.target_column),
            &self.config.target_column,
        );

        // Step 4: Validate
        report::print_step("Validating dataset...");
        let dataset = Dataset::from_records(records, &self.config.excluded_columns);
        let validator =
            DatasetValidator::new(&self.config.target_column, self.config.report_limits.clone());
        let outcome = validator.validate(dataset)?;

        if let Some(negative) = &outcome.negative_targets {
            stats.rows_dropped = negative.dropped;
            report::print_negative_targets(
                negative,
                &self.config.target_column,
                self.config.report_limits.max_listed_negative_files,
            );
        }
        println!(
            "  {} {} rows passed validation",
            "OK".bright_green(),
            outcome.dataset.len().to_string().bright_white().bold()
        );
        report::print_feature_listing(&FeatureListing::from_dataset(
            &outcome.dataset,
            &self.config.target_column,
        ));

        let Some(writer) = writer else {
            println!(
                "\n{}",
                "Validate-only mode - no file written".bright_green()
            );
            stats.processing_time_ms = start_time.elapsed().as_millis();
            return Ok(ExtractionOutcome::Validated { stats });
        };

        // Step 5: Export
        report::print_step("Writing dataset...");
        let dataset = outcome.dataset;
        let summary = task::spawn_blocking(move || writer.write(&dataset))
            .await
            .map_err(|e| ExtractError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("export task failed: {}", e),
            })??;

        stats.rows_exported = summary.rows;
        stats.processing_time_ms = start_time.elapsed().as_millis();
        report::print_export_summary(&summary);
        info!(
            "Exported {} rows from {} files in {} ms",
            summary.rows, stats.files_scanned, stats.processing_time_ms
        );

        Ok(ExtractionOutcome::Exported { summary, stats })
    }

    fn discover_files(&self) -> Result<Vec<PathBuf>> {
        let discovery = LogDiscovery::new(
            self.input_dir.clone(),
            self.config.log_extension.clone(),
            self.config.recursive,
        );
        let mut files = discovery.discover()?;
        let available = files.len();

        if apply_file_limit(&mut files, self.config.max_files) {
            println!(
                "  {} processing first {} of {} files",
                "Limited:".bright_yellow(),
                files.len(),
                available
            );
        } else if let Some(limit) = self.config.max_files {
            println!(
                "  {} max files ({}) exceeds available files ({}), processing all",
                "Note:".bright_yellow(),
                limit,
                available
            );
        }

        println!(
            "  {} {} .{} files",
            "Found".bright_green(),
            files.len().to_string().bright_white().bold(),
            self.config.log_extension
        );
        Ok(files)
    }

    async fn build_records(&self, tagged: Vec<TaggedLine>) -> Result<Vec<Record>> {
        let algorithm = self.algorithm;
        let pb = spinner(self.config.show_progress);
        pb.set_message(format!("Merging {} tagged lines...", tagged.len()));

        let records = task::spawn_blocking(move || {
            if algorithm.is_legacy() {
                LegacyRecordParser::new().parse(&tagged)
            } else {
                PairingEngine::new(algorithm).pair(tagged)
            }
        })
        .await
        .map_err(|e| ExtractError::ProcessingFailed {
            path: self.input_dir.clone(),
            reason: format!("record assembly task failed: {}", e),
        })?;

        pb.finish_and_clear();
        debug!("Built {} records", records.len());
        Ok(records)
    }

    fn no_data(
        &self,
        reason: NoDataReason,
        mut stats: ProcessingStats,
        start_time: Instant,
    ) -> ExtractionOutcome {
        report::print_no_data(reason, self.algorithm);
        stats.processing_time_ms = start_time.elapsed().as_millis();
        ExtractionOutcome::NoData { reason, stats }
    }
}

/// Resolve each selected line's tag, dropping lines that carry none of the
/// algorithm's markers
pub fn tag_lines(algorithm: Algorithm, lines: Vec<SelectedLine>) -> Vec<TaggedLine> {
    let total = lines.len();
    let tagged: Vec<TaggedLine> = lines
        .into_iter()
        .filter_map(|line| {
            algorithm.classify(&line.content).map(|tag| TaggedLine {
                source_file: line.source_file,
                line_number: line.line_number,
                tag,
                payload: line.content,
            })
        })
        .collect();

    if tagged.len() < total {
        debug!("{} selected lines carried no {} marker", total - tagged.len(), algorithm);
    }
    tagged
}

fn spinner(show_progress: bool) -> ProgressBar {
    if !show_progress {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .expect("static spinner template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
