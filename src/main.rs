//! check-status — verifies that the pipeline emitted a processed alert.
//!
//! Usage: `check-status "2024-01-01 10:00:00"`
//!
//! Exit status 0 when an alert with `windowStart` after the given time shows
//! up on the alerts stream within the deadline, 1 otherwise.

use std::process::ExitCode;

use clap::Parser;
use social_pipeline::config::StreamConfig;
use social_pipeline::verify::capture::CaptureStream;
use social_pipeline::verify::matcher::{parse_window_time, WindowStartMatcher};
use social_pipeline::verify::{
    EventPosition, PartitionSelector, StreamVerifier, VerifierConfig,
};

#[derive(Debug, Parser)]
#[command(name = "check-status", about = "Wait for a processed alert newer than a start time")]
struct Cli {
    /// Start time, `yyyy-MM-dd HH:mm:ss` (local, no timezone).
    start_time: String,
}

fn fail(msg: impl std::fmt::Display) -> ExitCode {
    println!("{msg}");
    ExitCode::from(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    social_pipeline::telemetry::init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e)
            if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) if e.kind() == clap::error::ErrorKind::MissingRequiredArgument => {
            return fail("Please provide a start date as the first argument");
        }
        Err(e) => return fail(e),
    };

    let start_time = match parse_window_time(&cli.start_time) {
        Ok(t) => t,
        Err(e) => {
            return fail(format!(
                "Invalid start date {:?} (expected yyyy-MM-dd HH:mm:ss): {e}",
                cli.start_time
            ))
        }
    };
    println!("Searching events after: {start_time}");

    let cfg = match StreamConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => return fail(e),
    };
    tracing::info!(endpoint = %cfg.endpoint(), config = ?cfg, "stream configured");

    let verifier = StreamVerifier::new(VerifierConfig {
        partition: cfg
            .partition
            .clone()
            .map(PartitionSelector::Id)
            .unwrap_or_default(),
        position: EventPosition::Start,
        deadline: cfg.deadline,
        batch_size: cfg.batch_size,
        ..VerifierConfig::default()
    });
    let client = CaptureStream::new(cfg.capture_dir.clone());
    let matcher = WindowStartMatcher::new(start_time);

    match verifier.run(client, &matcher).await {
        Ok(outcome) => {
            println!("{}", outcome.describe(cfg.deadline));
            ExitCode::from(outcome.exit_code() as u8)
        }
        Err(e) => fail(e),
    }
}
