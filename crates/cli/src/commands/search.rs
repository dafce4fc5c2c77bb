//! Search command handler.
//!
//! Runs one query through the discovery pipeline and prints the response
//! envelope as JSON on stdout (logs stay on stderr).

use clap::Args;
use shopscout_core::{config::AppConfig, AppResult};
use shopscout_discovery::{QueryRouter, SearchOptions};
use shopscout_provider::create_broker;
use std::sync::Arc;

/// Search for products by free text or a direct product URL
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Free-text query or product URL
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value = "6")]
    pub max_results: usize,

    /// Minimum price filter
    #[arg(long)]
    pub min_price: Option<f64>,

    /// Maximum price filter
    #[arg(long)]
    pub max_price: Option<f64>,

    /// Skip real-data sources and generate a synthetic catalog
    #[arg(long)]
    pub synthetic: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl SearchCommand {
    /// Execute the search command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(query = %self.query, "Executing search command");

        let broker = Arc::new(create_broker(config)?);
        let router = QueryRouter::new(config, broker);

        let options = SearchOptions {
            use_real_data: !self.synthetic,
            max_results: self.max_results,
            min_price: self.min_price,
            max_price: self.max_price,
        };

        let response = router.search(&self.query, &options).await;

        tracing::info!(
            records = response.records.len(),
            data_source = ?response.data_source,
            "Search complete"
        );

        let output = if self.pretty {
            serde_json::to_string_pretty(&response)?
        } else {
            serde_json::to_string(&response)?
        };
        println!("{}", output);

        Ok(())
    }
}
