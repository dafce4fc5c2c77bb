//! Adapter for the lightweight search/shopping service.
//!
//! This is the no-credential path: a thin shopping-results JSON feed with
//! string-typed prices and uneven field coverage. Extraction is tolerant
//! and per-field; a record is emitted only when a title and a positive
//! price both survive parsing.

use crate::adapters::{settle, SourceAdapter};
use crate::price::{clamp_rating, parse_price, parse_review_count};
use crate::transport::Transport;
use crate::types::{DraftRecord, SearchOptions, Source};
use serde_json::Value;
use shopscout_core::{AppError, AppResult};
use std::sync::Arc;
use url::Url;

pub struct WebSearchAdapter {
    endpoint: String,
    transport: Arc<dyn Transport>,
}

impl WebSearchAdapter {
    pub fn new(endpoint: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    fn build_url(&self, query: &str) -> AppResult<String> {
        Url::parse_with_params(&self.endpoint, [("q", query)])
            .map(|u| u.to_string())
            .map_err(|e| AppError::SourceUnavailable(format!("Bad endpoint URL: {}", e)))
    }

    async fn fetch_inner(&self, query: &str) -> AppResult<Vec<DraftRecord>> {
        let url = self.build_url(query)?;
        let body = self.transport.fetch_text(&url).await?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| AppError::SourceUnavailable(format!("Invalid JSON payload: {}", e)))?;

        let items = payload
            .get("shopping_results")
            .or_else(|| payload.get("organic_results"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::SourceUnavailable("Payload has no shopping_results array".to_string())
            })?;

        Ok(items.iter().filter_map(parse_item).collect())
    }
}

#[async_trait::async_trait]
impl SourceAdapter for WebSearchAdapter {
    fn source(&self) -> Source {
        Source::WebSearch
    }

    async fn fetch(&self, query: &str, options: &SearchOptions) -> Vec<DraftRecord> {
        tracing::info!(query, "Fetching from web search");
        let result = self.fetch_inner(query).await;
        let mut drafts = settle(self.source(), result);

        // The lightweight feed has no server-side price filter; apply the
        // caller's bounds here.
        if options.min_price.is_some() || options.max_price.is_some() {
            drafts.retain(|d| {
                options.min_price.map_or(true, |min| d.price >= min)
                    && options.max_price.map_or(true, |max| d.price <= max)
            });
        }
        drafts
    }
}

fn parse_item(item: &Value) -> Option<DraftRecord> {
    let title = item.get("title").and_then(Value::as_str)?.to_string();

    let price = match item.get("price") {
        Some(Value::String(s)) => parse_price(s),
        Some(Value::Number(n)) => n.as_f64().filter(|v| *v > 0.0),
        _ => item
            .get("extracted_price")
            .and_then(Value::as_f64)
            .filter(|v| *v > 0.0),
    }?;

    let mut draft = DraftRecord::new(title, price, Source::WebSearch);

    draft.original_price = item
        .get("old_price")
        .and_then(|v| match v {
            Value::String(s) => parse_price(s),
            Value::Number(n) => n.as_f64(),
            _ => None,
        })
        .filter(|v| *v > price);
    draft.image = item
        .get("thumbnail")
        .or_else(|| item.get("image"))
        .and_then(Value::as_str)
        .map(String::from);
    draft.rating = item
        .get("rating")
        .and_then(Value::as_f64)
        .map(clamp_rating);
    draft.review_count = item
        .get("reviews")
        .and_then(Value::as_u64)
        .map(|v| v.min(u32::MAX as u64) as u32)
        .or_else(|| {
            item.get("reviews")
                .and_then(Value::as_str)
                .and_then(parse_review_count)
        });
    draft.seller = item
        .get("source")
        .or_else(|| item.get("merchant"))
        .and_then(Value::as_str)
        .map(String::from);
    draft.shipping = item.get("delivery").and_then(Value::as_str).map(String::from);
    draft.product_url = item
        .get("link")
        .or_else(|| item.get("product_link"))
        .and_then(Value::as_str)
        .map(String::from);

    Some(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fixtures::StaticTransport;

    const FIXTURE: &str = r#"{
        "shopping_results": [
            {
                "title": "Apple Watch SE",
                "price": "$249.00",
                "old_price": "$279.00",
                "thumbnail": "https://img.test/se.jpg",
                "rating": 4.6,
                "reviews": 812,
                "source": "TechMart",
                "delivery": "Free shipping",
                "link": "https://techmart.test/watch-se"
            },
            {
                "title": "Smart Watch Fitness Tracker",
                "price": "$39.99",
                "rating": 4.1,
                "reviews": "2.1k"
            },
            {
                "title": "Watch Stand",
                "price": "Contact seller"
            }
        ]
    }"#;

    fn adapter(fixture: &str) -> WebSearchAdapter {
        let transport = StaticTransport::new().route("https://search.test", fixture);
        WebSearchAdapter::new("https://search.test/shopping", Arc::new(transport))
    }

    #[tokio::test]
    async fn test_parses_string_prices_and_counts() {
        let drafts = adapter(FIXTURE)
            .fetch("apple watch", &SearchOptions::default())
            .await;

        // The unpriced stand is dropped
        assert_eq!(drafts.len(), 2);

        let se = &drafts[0];
        assert_eq!(se.price, 249.0);
        assert_eq!(se.original_price, Some(279.0));
        assert_eq!(se.review_count, Some(812));
        assert_eq!(se.seller.as_deref(), Some("TechMart"));
        assert_eq!(se.source, Source::WebSearch);

        let tracker = &drafts[1];
        assert_eq!(tracker.review_count, Some(2100));
    }

    #[tokio::test]
    async fn test_price_bounds_filter() {
        let options = SearchOptions {
            max_price: Some(100.0),
            ..Default::default()
        };
        let drafts = adapter(FIXTURE).fetch("watch", &options).await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "Smart Watch Fitness Tracker");
    }

    #[tokio::test]
    async fn test_failure_is_empty() {
        let drafts = adapter("not json")
            .fetch("watch", &SearchOptions::default())
            .await;
        assert!(drafts.is_empty());
    }
}
