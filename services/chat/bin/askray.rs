//! Main Entrypoint for the Ask Ray terminal client
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment (optionally from an env file).
//! 2. Initializing logging.
//! 3. Handing control to the conversation loop.

use askray_chat::{app::run, config::Config, render::Renderer};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Ask Ray conversational assistant for the portal")]
struct Cli {
    /// Load environment variables from this file before reading configuration.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(path) = &cli.env_file {
        dotenvy::from_path(path)?;
    }

    // --- 1. Load Configuration ---
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            // An incomplete setup shows a warning instead of the widget.
            Renderer::new(std::io::stdout()).unconfigured(e)?;
            return Ok(());
        }
    };

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!("Configuration loaded. Starting conversation...");

    // --- 3. Run ---
    run(config).await
}
