//! Multi-source product discovery and enrichment pipeline.
//!
//! Given a free-text query or a direct product URL, the pipeline fans out
//! to multiple live data sources with independent failure modes, normalizes
//! heterogeneous partial records into one canonical shape, deduplicates and
//! ranks them, and patches in generated narrative content where real data
//! is sparse — without ever overwriting ground-truth fields.
//!
//! The entry point is [`QueryRouter::search`]; everything is created and
//! destroyed within a single query→response call. There is no cross-request
//! cache or store in this crate.
//!
//! # Example
//! ```no_run
//! use shopscout_core::AppConfig;
//! use shopscout_discovery::{QueryRouter, SearchOptions};
//! use shopscout_provider::create_broker;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let broker = Arc::new(create_broker(&config)?);
//! let router = QueryRouter::new(&config, broker);
//!
//! let response = router.search("apple watch", &SearchOptions::default()).await;
//! println!("{} records ({:?})", response.records.len(), response.data_source);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod enrich;
pub mod intent;
pub mod price;
pub mod rank;
pub mod router;
pub mod synthetic;
pub mod transport;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export the public surface
pub use enrich::Enricher;
pub use intent::QueryIntent;
pub use router::QueryRouter;
pub use synthetic::SyntheticCatalog;
pub use transport::{HttpTransport, Transport};
pub use types::{
    CanonicalProduct, DataSource, DraftRecord, SampleReview, SearchOptions, SearchResponse,
    Sentiment, Source,
};
