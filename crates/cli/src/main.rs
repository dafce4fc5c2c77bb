//! ShopScout CLI
//!
//! Thin front end over the in-process discovery pipeline. The pipeline has
//! no network surface of its own; this binary exists for manual runs and
//! smoke checks.

mod commands;

use clap::{Parser, Subcommand};
use commands::SearchCommand;
use shopscout_core::{config::AppConfig, logging, AppResult};

/// ShopScout - multi-source product discovery and enrichment
#[derive(Parser, Debug)]
#[command(name = "shopscout")]
#[command(about = "Multi-source product discovery and enrichment", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for products by text query or URL
    Search(SearchCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Load base configuration from environment, then apply CLI overrides
    let config = AppConfig::load()?;
    let config = config.with_overrides(cli.log_level, cli.verbose, cli.no_color);
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("ShopScout starting");
    tracing::debug!(
        primary = %config.primary_provider,
        secondary = %config.secondary_provider,
        structured_credential = config.has_structured_credential(),
        "Configuration loaded"
    );

    let result = match cli.command {
        Commands::Search(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
