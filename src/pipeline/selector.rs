//! Line selection for solver logs
//!
//! Narrows a set of log files down to the lines containing any of a set of
//! literal markers. Matching is exact substring matching, never regex, so a
//! marker like `FP_FEATURES:` does not pick up ordinary `FP` debug output.

use crate::constants::progress::{BAR_TEMPLATE, PROGRESS_CHARS};
use crate::error::{ExtractError, Result};
use crate::models::SelectedLine;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, warn};

/// Capability to search files for literal patterns.
///
/// Implementations return matching lines in file-then-line order: files in
/// the order given, lines ascending within each file.
pub trait LineSelector: Debug + Send + Sync {
    fn search(&self, files: &[PathBuf], patterns: &[String]) -> Result<Vec<SelectedLine>>;
}

/// Scans log files from disk, line by line
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLineSelector;

impl FileLineSelector {
    pub fn new() -> Self {
        Self
    }
}

impl LineSelector for FileLineSelector {
    fn search(&self, files: &[PathBuf], patterns: &[String]) -> Result<Vec<SelectedLine>> {
        let mut matches = Vec::new();
        for file in files {
            scan_file(file, patterns, &mut matches)?;
        }
        Ok(matches)
    }
}

/// Append the lines of `path` that contain any pattern.
///
/// Lines are read as bytes and decoded lossily, so stray binary output in a
/// log does not abort the scan.
fn scan_file(path: &Path, patterns: &[String], matches: &mut Vec<SelectedLine>) -> Result<()> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::with_capacity(512);
    let mut line_number = 0usize;
    let before = matches.len();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            break;
        }
        line_number += 1;

        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim_end_matches(['\n', '\r']);
        if patterns.iter().any(|p| line.contains(p.as_str())) {
            matches.push(SelectedLine {
                source_file: path.to_path_buf(),
                line_number,
                content: line.to_string(),
            });
        }
    }

    debug!(
        "Selected {} of {} lines from {}",
        matches.len() - before,
        line_number,
        path.display()
    );
    Ok(())
}

/// Result of selecting lines across a file set
#[derive(Debug, Default)]
pub struct Selection {
    pub lines: Vec<SelectedLine>,
    pub files_scanned: usize,
    pub files_failed: usize,
}

/// Run a selector over each file with bounded concurrency.
///
/// Files are searched one per blocking task; results are reassembled in
/// input order, so the combined output keeps the selector's file-then-line
/// ordering. Unreadable files are logged and skipped.
pub async fn select_lines(
    selector: Arc<dyn LineSelector>,
    files: &[PathBuf],
    patterns: &[&str],
    max_concurrent: usize,
    show_progress: bool,
) -> Result<Selection> {
    let patterns: Arc<Vec<String>> = Arc::new(patterns.iter().map(|p| p.to_string()).collect());

    let pb = if show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .expect("static progress template")
                .progress_chars(PROGRESS_CHARS),
        );
        pb.set_message("Scanning logs");
        pb
    } else {
        ProgressBar::hidden()
    };

    let concurrent_limit = max_concurrent.clamp(1, files.len().max(1));
    debug!(
        "Selecting lines from {} files with concurrency {}",
        files.len(),
        concurrent_limit
    );

    let results: Vec<(PathBuf, Result<Vec<SelectedLine>>)> = stream::iter(files.iter().cloned())
        .map(|file| {
            let selector = Arc::clone(&selector);
            let patterns = Arc::clone(&patterns);
            let pb = pb.clone();
            async move {
                let task_file = file.clone();
                let result = task::spawn_blocking(move || {
                    selector.search(std::slice::from_ref(&task_file), &patterns)
                })
                .await
                .map_err(|e| ExtractError::ProcessingFailed {
                    path: file.clone(),
                    reason: format!("line selection task failed: {}", e),
                })
                .and_then(|inner| inner);
                pb.inc(1);
                (file, result)
            }
        })
        .buffered(concurrent_limit)
        .collect()
        .await;

    let mut selection = Selection::default();
    for (file, result) in results {
        match result {
            Ok(lines) => {
                selection.files_scanned += 1;
                selection.lines.extend(lines);
            }
            Err(e) => {
                warn!("Skipping unreadable log {}: {}", file.display(), e);
                selection.files_failed += 1;
            }
        }
    }

    pb.finish_with_message(format!("{} matching lines", selection.lines.len()));
    Ok(selection)
}
