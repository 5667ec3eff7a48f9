//! ProDoc - rich-text document editor engine
//! 
//! Command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use prodoc::commands::{self, Cli};
use prodoc::{APP_NAME, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("prodoc=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("{} v{} starting...", APP_NAME, VERSION);
    commands::run(cli).await
}
