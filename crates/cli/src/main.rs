//! Host process entry point.
//!
//! The host speaks newline-delimited JSON over stdio: operations in,
//! events out. All logging goes to stderr so stdout stays a clean event
//! stream for the embedding UI.

use anyhow::Context;
use clap::Parser;
use rk_core::bridge::Host;
use rk_core::config::load_config;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "replay-host", about = "Macro recorder/replayer host core")]
struct Cli {
    /// Path to the core configuration file. Missing file means built-in
    /// defaults; a present but malformed file is an error.
    #[arg(long, default_value = "replay-kit.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;

    tracing::info!("replay-kit host starting");
    let host = Host::new(config);
    host.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;
    tracing::info!("replay-kit host stopped");

    Ok(())
}
