//! xlframe MCP server binary entry point
//!
//! Loads the configuration, installs logging on stderr and calls the
//! library's `run_server()`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use xlframe_mcp::{run_server, Settings};

#[derive(Parser)]
#[command(name = "xlframe-mcp")]
#[command(author, version, about = "MCP server for reading Excel workbooks", long_about = None)]
struct Cli {
    /// Configuration file (defaults to $XLFRAME_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::discover(cli.config.as_deref()).context("Failed to load configuration")?;

    // stdout carries the protocol; logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run_server(settings).await.context("Server I/O failed")?;
    Ok(())
}
