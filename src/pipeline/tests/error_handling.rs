//! Error handling integration tests

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::models::{Algorithm, ExtractionOutcome, NoDataReason};
use crate::pipeline::LogExtractor;
use crate::validation::IssueKind;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_logs(temp_dir: &TempDir, logs: &[(&str, &str)]) -> PathBuf {
    let log_dir = temp_dir.path().join("logs");
    fs::create_dir_all(&log_dir).unwrap();
    for (name, content) in logs {
        fs::write(log_dir.join(name), content).unwrap();
    }
    log_dir
}

fn extractor(log_dir: PathBuf, algorithm: Algorithm, output: &PathBuf) -> LogExtractor {
    LogExtractor::new(log_dir, algorithm, Some(output.clone()))
        .unwrap()
        .with_config(ExtractConfig::default().without_progress())
}

#[tokio::test]
async fn test_nonexistent_input_dir() {
    let temp_dir = TempDir::new().unwrap();
    let nonexistent_path = temp_dir.path().join("nonexistent");

    let result = LogExtractor::new(nonexistent_path.clone(), Algorithm::FeasibilityPump, None);

    match result.unwrap_err() {
        ExtractError::InputNotFound { path } => assert_eq!(path, nonexistent_path),
        other => panic!("Expected InputNotFound error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_directory_without_logs() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(&temp_dir, &[("notes.txt", "FP_RESULT: iter=1")]);
    let output = temp_dir.path().join("fp.parquet");

    let result = extractor(log_dir, Algorithm::FeasibilityPump, &output)
        .process()
        .await;

    assert!(matches!(result, Err(ExtractError::NoLogFiles { .. })));
}

#[tokio::test]
async fn test_no_matching_lines_is_no_data() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(
        &temp_dir,
        &[("run.log", "CP_FEATURES: a=1\nCP_RESULT: iter=2\nFP round 1\n")],
    );
    let output = temp_dir.path().join("fp.parquet");

    let outcome = extractor(log_dir, Algorithm::FeasibilityPump, &output)
        .process()
        .await
        .unwrap();

    match &outcome {
        ExtractionOutcome::NoData { reason, stats } => {
            assert_eq!(*reason, NoDataReason::NoMatchingLines);
            assert_eq!(stats.files_scanned, 1);
        }
        other => panic!("Expected NoData outcome, got {:?}", other),
    }
    assert_eq!(outcome.exit_code(), 2);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_incomplete_groups_are_no_data() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(
        &temp_dir,
        &[
            ("features_only.log", "CP_FEATURES: a=1\nCP_FEATURES: b=2\n"),
            ("orphan.log", "CP_RESULT: iter=4\n"),
        ],
    );
    let output = temp_dir.path().join("cp.parquet");

    let outcome = extractor(log_dir, Algorithm::ConstraintPropagation, &output)
        .process()
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        ExtractionOutcome::NoData {
            reason: NoDataReason::NoCompleteRecords,
            ..
        }
    ));
    assert_eq!(outcome.stats().lines_matched, 3);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_values_block_export() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(
        &temp_dir,
        &[
            ("good.log", "FP_FEATURES: a=1 b=2\nFP_RESULT: iter=3\n"),
            ("truncated.log", "FP_FEATURES: a=1\nFP_RESULT: iter=5\n"),
        ],
    );
    let output = temp_dir.path().join("fp.parquet");

    let result = extractor(log_dir, Algorithm::FeasibilityPump, &output)
        .process()
        .await;

    match result.unwrap_err() {
        ExtractError::ValidationFailed { report } => {
            assert_eq!(report.total_rows, 2);
            assert_eq!(report.invalid_rows, 1);
            let missing: Vec<_> = report.issues_of(IssueKind::Missing).collect();
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].column, "b");
            assert_eq!(missing[0].percentage, 50.0);
            assert_eq!(report.problem_files.len(), 1);
            assert_eq!(report.problem_files[0].file, "truncated.log");
        }
        other => panic!("Expected ValidationFailed error, got {:?}", other),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_non_finite_values_block_export() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(
        &temp_dir,
        &[(
            "run.log",
            "PDLP_FEATURES: gap=0.5\nPDLP_RESULT: iter=3\nPDLP_FEATURES: gap=nan\nPDLP_RESULT: iter=4\n",
        )],
    );
    let output = temp_dir.path().join("pdlp.parquet");

    let result = extractor(log_dir, Algorithm::Pdlp, &output).process().await;

    match result.unwrap_err() {
        ExtractError::ValidationFailed { report } => {
            let non_finite: Vec<_> = report.issues_of(IssueKind::NonFinite).collect();
            assert_eq!(non_finite.len(), 1);
            assert_eq!(non_finite[0].column, "gap");
            assert_eq!(non_finite[0].count, 1);
        }
        other => panic!("Expected ValidationFailed error, got {:?}", other),
    }
    assert!(!output.exists());
}

#[tokio::test]
async fn test_all_negative_targets_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(
        &temp_dir,
        &[("run.log", "FJ: a=1 iter=-1\nFJ: a=2 iter=-3\n")],
    );
    let output = temp_dir.path().join("fj.parquet");

    let result = extractor(log_dir, Algorithm::FeasibilityJump, &output)
        .process()
        .await;

    assert!(matches!(result, Err(ExtractError::NoValidRows { dropped: 2 })));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unsupported_output_extension_fails_early() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(&temp_dir, &[("run.log", "FJ: a=1 iter=1\n")]);
    let output = temp_dir.path().join("fj.csv");

    let result = extractor(log_dir, Algorithm::FeasibilityJump, &output)
        .process()
        .await;

    assert!(matches!(
        result,
        Err(ExtractError::UnsupportedOutputFormat { .. })
    ));
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let log_dir = write_logs(&temp_dir, &[("run.log", "FJ: a=1 iter=1\n")]);

    let result = LogExtractor::new(log_dir, Algorithm::FeasibilityJump, None)
        .unwrap()
        .with_config(
            ExtractConfig::default()
                .without_progress()
                .with_excluded_columns(["iter"]),
        )
        .process()
        .await;

    assert!(matches!(result, Err(ExtractError::Configuration { .. })));
}
