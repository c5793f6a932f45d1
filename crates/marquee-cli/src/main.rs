//! Marquee command-line client

mod commands;
mod format;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Commands;

use marquee_core::config::AppConfig;
use marquee_runtime::Runtime;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(about = "Browse, favorite and stream titles from a Marquee server")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides the config file and MARQUEE_API_URL)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Also write logs to a daily file in the data directory
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_file)?;

    let mut config = AppConfig::load().context("failed to load config")?;
    if let Some(url) = cli.api {
        config.api.base_url = url;
    }
    tracing::debug!(api = %config.api.base_url, "starting");

    let runtime = Runtime::new(config)
        .await
        .context("failed to start client")?;
    cli.command.execute(&runtime).await
}
