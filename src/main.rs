use clap::Parser;
use solverlog_extract::cli::{Args, setup_logging};
use solverlog_extract::report::print_validation_failure;
use solverlog_extract::{ExtractError, ExtractionOutcome, LogExtractor};
use std::process;

async fn run(args: Args) -> anyhow::Result<ExtractionOutcome> {
    let algorithm = args.algorithm()?;
    let config = args.to_config()?;

    let extractor =
        LogExtractor::new(args.input_dir.clone(), algorithm, args.output.clone())?.with_config(config);

    Ok(extractor.process().await?)
}

fn main() {
    let args = Args::parse();
    setup_logging(args.log_level());

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = run(args) => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(ExtractError::Interrupted {
                    reason: "extraction cancelled by user, no dataset written".to_string(),
                }
                .into())
            }
        }
    });

    match result {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(error) => {
            match error.downcast_ref::<ExtractError>() {
                Some(ExtractError::ValidationFailed { report }) => print_validation_failure(report),
                _ => eprintln!("Error: {:#}", error),
            }
            process::exit(1);
        }
    }
}
