//! Top-level query orchestration.
//!
//! `QueryRouter::search` is the in-process boundary the chat front end
//! calls: classify the query, fan out to the applicable source adapters,
//! rank and enrich what comes back, and assemble the response envelope with
//! its aggregate provenance classification.
//!
//! Path selection:
//! - URL query: direct-detail adapter only; on failure fall through.
//! - Real-data path: structured API (when a credential is configured) and
//!   web search fan out concurrently; the router proceeds once all have
//!   settled, and an isolated failure contributes an empty list.
//! - Zero real drafts with real data requested returns an empty list —
//!   synthetic content is never substituted silently.
//! - Explicit synthetic path (`use_real_data = false`) skips adapters
//!   entirely.

use crate::adapters::{DetailAdapter, SourceAdapter, StructuredApiAdapter, WebSearchAdapter};
use crate::enrich::Enricher;
use crate::intent::{is_url, QueryIntent};
use crate::rank::rank;
use crate::synthetic::SyntheticCatalog;
use crate::transport::{HttpTransport, Transport};
use crate::types::{DataSource, DraftRecord, SearchOptions, SearchResponse};
use futures::future::join_all;
use shopscout_core::AppConfig;
use shopscout_provider::ProviderBroker;
use std::sync::Arc;
use std::time::Duration;

pub struct QueryRouter {
    structured: Option<Arc<StructuredApiAdapter>>,
    websearch: Arc<WebSearchAdapter>,
    detail: Arc<DetailAdapter>,
    enricher: Enricher,
    synthetic: SyntheticCatalog,
}

impl QueryRouter {
    /// Production wiring: HTTP transport with the configured timeout.
    pub fn new(config: &AppConfig, broker: Arc<ProviderBroker>) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(Duration::from_secs(
            config.request_timeout_secs,
        )));
        Self::with_transport(config, broker, transport)
    }

    /// Wiring with an injected transport, used by tests to serve recorded
    /// fixture payloads.
    pub fn with_transport(
        config: &AppConfig,
        broker: Arc<ProviderBroker>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let structured = config.structured_api_key.as_deref().map(|key| {
            Arc::new(StructuredApiAdapter::new(
                &config.structured_endpoint,
                key,
                Arc::clone(&transport),
            ))
        });
        let websearch = Arc::new(WebSearchAdapter::new(
            &config.search_endpoint,
            Arc::clone(&transport),
        ));
        let detail = Arc::new(DetailAdapter::new(Arc::clone(&transport)));

        let enricher = Enricher::new(Arc::clone(&broker))
            .with_detail_hydration(Arc::clone(&detail), config.detail_concurrency);
        let synthetic = SyntheticCatalog::new(broker);

        Self {
            structured,
            websearch,
            detail,
            enricher,
            synthetic,
        }
    }

    /// Resolve a query into canonical products plus an aggregate
    /// data-source classification. Infallible by design: every failure mode
    /// degrades to fewer (or zero) records, never an error for "no
    /// matches".
    pub async fn search(&self, query: &str, options: &SearchOptions) -> SearchResponse {
        tracing::info!(query, max_results = options.max_results, "Resolving query");

        // Explicit synthetic path: adapters are skipped entirely
        if !options.use_real_data {
            tracing::info!("Synthetic path requested");
            let records = self.synthetic.generate(query, options.max_results).await;
            let data_source = DataSource::classify(&records, DataSource::AiGenerated);
            return SearchResponse {
                records,
                data_source,
            };
        }

        // Direct URL bypasses the multi-source fan-out
        if is_url(query) {
            let drafts = self.detail.fetch(query, options).await;
            if !drafts.is_empty() {
                let records = self.enricher.enrich(drafts, query).await;
                let data_source = DataSource::classify(&records, DataSource::RealTime);
                return SearchResponse {
                    records,
                    data_source,
                };
            }
            tracing::warn!("Direct URL fetch produced nothing, falling through to search");
        }

        let intent = QueryIntent::classify(query);
        let effective = effective_options(options, &intent);

        let drafts = self.fan_out(query, &effective).await;
        tracing::info!(drafts = drafts.len(), "Sources settled");

        if drafts.is_empty() {
            // Real data was requested and none was found: an empty list is
            // the answer, not a cue to generate one.
            return SearchResponse {
                records: Vec::new(),
                data_source: DataSource::RealTime,
            };
        }

        let ranked = rank(drafts, query, &intent, effective.max_results);
        let records = self.enricher.enrich(ranked, query).await;
        let data_source = DataSource::classify(&records, DataSource::RealTime);

        SearchResponse {
            records,
            data_source,
        }
    }

    /// Launch every applicable adapter concurrently and wait for all of
    /// them to settle. Results keep adapter priority order so the dedup
    /// tie-break sees the preferred source first.
    async fn fan_out(&self, query: &str, options: &SearchOptions) -> Vec<DraftRecord> {
        let mut adapters: Vec<&dyn SourceAdapter> = Vec::with_capacity(2);
        if let Some(ref structured) = self.structured {
            adapters.push(structured.as_ref());
        }
        adapters.push(self.websearch.as_ref());

        let fetches = adapters
            .iter()
            .map(|adapter| adapter.fetch(query, options));

        join_all(fetches).await.into_iter().flatten().collect()
    }
}

/// Merge explicit price bounds with intent hints; explicit options win.
fn effective_options(options: &SearchOptions, intent: &QueryIntent) -> SearchOptions {
    SearchOptions {
        use_real_data: options.use_real_data,
        max_results: options.max_results,
        min_price: options.min_price.or(intent.min_price),
        max_price: options.max_price.or(intent.max_price),
    }
}
