//! Lineage View CLI binary.

use colored::Colorize;
use lineage_view::cli::Cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Main entry point for the lineage-view CLI.
///
/// Uses tokio's `current_thread` runtime: commands are sequential and I/O bound.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // RUST_LOG wins over -v.
    // Example: RUST_LOG=lineage_graph=trace lineage-view render
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting lineage-view CLI");

    match cli.execute().await {
        Ok(()) => {
            tracing::debug!("lineage-view completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            for cause in e.chain().skip(1) {
                eprintln!("  {} {cause}", "caused by:".dimmed());
            }
            ExitCode::FAILURE
        }
    }
}
