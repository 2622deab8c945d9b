// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "frame-detect")]
#[command(about = "Run barcode detection over a camera frame and map results into view space")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image file as a single camera frame
    Analyze(cli::AnalyzeArgs),

    /// List known barcode formats
    Formats,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=frame_detect=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => cli::analyze(args)?,
        Commands::Formats => cli::list_formats()?,
    }

    Ok(())
}
