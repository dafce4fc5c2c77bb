//! Source adapters: one implementation per upstream channel.
//!
//! An adapter turns one source's raw payload into draft records. The
//! contract is total: `fetch` never lets an error cross its boundary — any
//! network or parse failure is logged as non-fatal and resolves to an empty
//! list, so one failing source can never cancel its siblings.

mod detail;
mod structured;
mod websearch;

pub use detail::DetailAdapter;
pub use structured::StructuredApiAdapter;
pub use websearch::WebSearchAdapter;

use crate::types::{DraftRecord, SearchOptions, Source};

/// One upstream channel's view of a query.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which provenance tag this adapter emits.
    fn source(&self) -> Source;

    /// Fetch drafts for a query. Infallible at the boundary: failures
    /// contribute an empty list.
    async fn fetch(&self, query: &str, options: &SearchOptions) -> Vec<DraftRecord>;
}

/// Shared boundary guard: run a fallible fetch, keep only viable drafts,
/// log failures at warn and contribute nothing.
pub(crate) fn settle(
    source: Source,
    result: shopscout_core::AppResult<Vec<DraftRecord>>,
) -> Vec<DraftRecord> {
    match result {
        Ok(drafts) => {
            let total = drafts.len();
            let viable: Vec<DraftRecord> = drafts.into_iter().filter(|d| d.is_viable()).collect();
            if viable.len() < total {
                tracing::debug!(
                    source = source.tag(),
                    dropped = total - viable.len(),
                    "Dropped drafts missing title or positive price"
                );
            }
            viable
        }
        Err(err) => {
            tracing::warn!(source = source.tag(), error = %err, "Source failed, contributing nothing");
            Vec::new()
        }
    }
}
