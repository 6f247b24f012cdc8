//! Log file discovery
//!
//! Finds the solver log files to scan in an input directory, either the
//! top level only (glob) or the whole tree (walkdir).

use crate::error::{ExtractError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File discovery component for solver log directories
#[derive(Debug, Clone)]
pub struct LogDiscovery {
    input_dir: PathBuf,
    extension: String,
    recursive: bool,
}

impl LogDiscovery {
    pub fn new(input_dir: PathBuf, extension: impl Into<String>, recursive: bool) -> Self {
        Self {
            input_dir,
            extension: extension.into(),
            recursive,
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Discover all log files, sorted by path.
    ///
    /// ```text
    /// logs/
    ///   instance_a.log      <- always found
    ///   instance_b.log
    ///   batch_2/
    ///     instance_c.log    <- only with recursive discovery
    /// ```
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.input_dir.is_dir() {
            return Err(ExtractError::InputNotFound {
                path: self.input_dir.clone(),
            });
        }

        let mut files = if self.recursive {
            self.discover_recursive()?
        } else {
            self.discover_top_level()?
        };
        files.sort();

        debug!(
            "Found {} .{} files in {}",
            files.len(),
            self.extension,
            self.input_dir.display()
        );

        if files.is_empty() {
            return Err(ExtractError::NoLogFiles {
                path: self.input_dir.clone(),
                extension: self.extension.clone(),
            });
        }

        Ok(files)
    }

    fn discover_top_level(&self) -> Result<Vec<PathBuf>> {
        let dir = glob::Pattern::escape(&self.input_dir.to_string_lossy());
        let pattern = format!("{}/*.{}", dir, self.extension);
        debug!("Searching for log files with pattern: {}", pattern);

        let paths = glob::glob(&pattern).map_err(|e| ExtractError::Configuration {
            message: format!("invalid log file pattern '{}': {}", pattern, e),
        })?;

        let mut files = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable path {}: {}", e.path().display(), e),
            }
        }
        Ok(files)
    }

    fn discover_recursive(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.input_dir).follow_links(true) {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() && is_log_file(entry.path(), &self.extension) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Check whether a path carries the given extension
pub fn is_log_file(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// Keep only the first `max_files` paths, if a limit is set
pub fn apply_file_limit(files: &mut Vec<PathBuf>, max_files: Option<usize>) -> bool {
    match max_files {
        Some(limit) if limit < files.len() => {
            files.truncate(limit);
            true
        }
        _ => false,
    }
}
