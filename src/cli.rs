//! Command-line interface components.

use crate::config::{CompressionAlgorithm, ExtractConfig};
use crate::models::Algorithm;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "solverlog-extract")]
#[command(about = "Extract solver predictor training data from log files into Parquet or Arrow IPC")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory containing solver log files
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Algorithm whose tagged lines to extract (FP, PDLP, CP, FJ)
    #[arg(short, long)]
    pub algorithm: String,

    /// Output file; .parquet/.pq for Parquet, .feather/.arrow/.ipc for Arrow IPC
    /// [default: <alg>_data.parquet]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Only scan the first N log files, in path order
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Log file extension to look for
    #[arg(long, default_value = "log")]
    pub extension: String,

    /// Search subdirectories as well
    #[arg(long)]
    pub recursive: bool,

    /// Output compression (snappy, zstd, lz4, none)
    #[arg(long, default_value = "lz4")]
    pub compression: String,

    /// Feature columns to leave out of the dataset, comma separated
    #[arg(long, value_delimiter = ',', value_name = "COLUMNS")]
    pub exclude: Vec<String>,

    /// Run extraction and validation without writing a file
    #[arg(long)]
    pub validate_only: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn algorithm(&self) -> Result<Algorithm> {
        self.algorithm
            .parse()
            .with_context(|| format!("Invalid --algorithm value '{}'", self.algorithm))
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Build the extraction config from the parsed flags
    pub fn to_config(&self) -> Result<ExtractConfig> {
        let compression: CompressionAlgorithm = self
            .compression
            .parse()
            .with_context(|| format!("Invalid --compression value '{}'", self.compression))?;

        let excluded: Vec<String> = self
            .exclude
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let mut config = ExtractConfig::default()
            .with_log_extension(self.extension.clone())
            .with_compression(compression)
            .with_excluded_columns(excluded);

        if let Some(max_files) = self.max_files {
            config = config.with_max_files(max_files);
        }
        if self.recursive {
            config = config.with_recursive();
        }
        if self.validate_only {
            config = config.with_validate_only();
        }
        if self.no_progress {
            config = config.without_progress();
        }

        config.validate().context("Invalid command-line options")?;
        Ok(config)
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("solverlog_extract={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}
