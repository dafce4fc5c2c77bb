//! Adapter for the paid structured shopping API.
//!
//! The structured API returns well-formed JSON, but field placement still
//! varies by result type, so every field is read through a list of
//! candidate paths.

use crate::adapters::{settle, SourceAdapter};
use crate::price::{clamp_rating, parse_price, parse_review_count};
use crate::transport::Transport;
use crate::types::{DraftRecord, SearchOptions, Source};
use serde_json::Value;
use shopscout_core::{AppError, AppResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use url::Url;

pub struct StructuredApiAdapter {
    endpoint: String,
    api_key: String,
    transport: Arc<dyn Transport>,
}

impl StructuredApiAdapter {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            transport,
        }
    }

    fn build_url(&self, query: &str, options: &SearchOptions) -> AppResult<String> {
        let mut params: Vec<(&str, String)> = vec![
            ("api_key", self.api_key.clone()),
            ("type", "search".to_string()),
            ("q", query.to_string()),
        ];
        if let Some(min) = options.min_price {
            params.push(("min_price", format!("{}", min)));
        }
        if let Some(max) = options.max_price {
            params.push(("max_price", format!("{}", max)));
        }

        Url::parse_with_params(&self.endpoint, params)
            .map(|u| u.to_string())
            .map_err(|e| AppError::SourceUnavailable(format!("Bad endpoint URL: {}", e)))
    }

    async fn fetch_inner(&self, query: &str, options: &SearchOptions) -> AppResult<Vec<DraftRecord>> {
        let url = self.build_url(query, options)?;
        let body = self.transport.fetch_text(&url).await?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| AppError::SourceUnavailable(format!("Invalid JSON payload: {}", e)))?;

        let items = payload
            .get("search_results")
            .or_else(|| payload.get("results"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::SourceUnavailable("Payload has no search_results array".to_string())
            })?;

        Ok(items.iter().filter_map(parse_item).collect())
    }
}

#[async_trait::async_trait]
impl SourceAdapter for StructuredApiAdapter {
    fn source(&self) -> Source {
        Source::StructuredApi
    }

    async fn fetch(&self, query: &str, options: &SearchOptions) -> Vec<DraftRecord> {
        tracing::info!(query, "Fetching from structured shopping API");
        settle(self.source(), self.fetch_inner(query, options).await)
    }
}

/// Parse one result item; `None` when title or price cannot be recovered.
fn parse_item(item: &Value) -> Option<DraftRecord> {
    let product = item.get("product").unwrap_or(item);

    let title = first_str(product, &["title", "name"])?.to_string();
    let price = item_price(item)?;

    let mut draft = DraftRecord::new(title, price, Source::StructuredApi);

    draft.original_price = first_f64(item, &["price_was", "list_price"]).or_else(|| {
        item.get("prices")
            .and_then(Value::as_array)
            .and_then(|prices| prices.iter().find_map(|p| first_f64(p, &["was_price"])))
    });
    draft.image = first_str(product, &["main_image", "image", "thumbnail"]).map(String::from);
    draft.rating = first_f64(product, &["rating"])
        .or_else(|| first_f64(item, &["rating"]))
        .map(clamp_rating);
    draft.review_count = first_u32(product, &["ratings_total", "reviews_total"])
        .or_else(|| first_u32(item, &["ratings_total"]))
        .or_else(|| {
            first_str(product, &["ratings_total_raw"]).and_then(parse_review_count)
        });
    draft.brand = first_str(product, &["brand"]).map(String::from);
    draft.availability = item
        .pointer("/availability/raw")
        .or_else(|| item.get("availability"))
        .and_then(Value::as_str)
        .map(String::from);
    draft.product_url = first_str(product, &["link", "url"]).map(String::from);
    draft.seller = item
        .pointer("/offers/primary/seller/name")
        .or_else(|| item.pointer("/seller/name"))
        .and_then(Value::as_str)
        .map(String::from);
    draft.shipping = item
        .pointer("/delivery/tagline")
        .or_else(|| item.get("shipping"))
        .and_then(Value::as_str)
        .map(String::from);
    draft.specifications = parse_specifications(product);

    Some(draft)
}

fn item_price(item: &Value) -> Option<f64> {
    // Preferred: offer price object {value, currency}
    if let Some(value) = item
        .pointer("/offers/primary/price")
        .or_else(|| item.pointer("/price/value"))
        .and_then(Value::as_f64)
    {
        if value > 0.0 {
            return Some(value);
        }
    }
    // Numeric or raw-string price
    match item.get("price").or_else(|| item.pointer("/prices/0/value")) {
        Some(Value::Number(n)) => n.as_f64().filter(|v| *v > 0.0),
        Some(Value::String(s)) => parse_price(s),
        Some(Value::Object(obj)) => obj.get("raw").and_then(Value::as_str).and_then(parse_price),
        _ => None,
    }
}

fn parse_specifications(product: &Value) -> Option<BTreeMap<String, String>> {
    let specs = product
        .get("specifications")
        .or_else(|| product.get("attributes"))?
        .as_array()?;

    let map: BTreeMap<String, String> = specs
        .iter()
        .filter_map(|spec| {
            let name = first_str(spec, &["name", "key"])?;
            let value = first_str(spec, &["value"])?;
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| value.get(k).and_then(Value::as_str))
}

fn first_f64(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| value.get(k).and_then(Value::as_f64))
}

fn first_u32(value: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter()
        .find_map(|k| value.get(k).and_then(Value::as_u64))
        .map(|v| v.min(u32::MAX as u64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fixtures::StaticTransport;

    const FIXTURE: &str = r#"{
        "search_results": [
            {
                "product": {
                    "title": "Apple Watch Series 10",
                    "brand": "Apple",
                    "main_image": "https://img.test/watch.jpg",
                    "rating": 4.7,
                    "ratings_total": 1523,
                    "link": "https://store.test/watch"
                },
                "offers": {"primary": {"price": 399.0, "seller": {"name": "BestStore"}}},
                "availability": {"raw": "In Stock"}
            },
            {
                "product": {"title": "Watch Band", "rating": 4.1},
                "price": "$19.99"
            },
            {
                "product": {"title": "No Price Item"}
            },
            {
                "price": 25.0
            }
        ]
    }"#;

    fn adapter(fixture: &str) -> StructuredApiAdapter {
        let transport = StaticTransport::new().route("https://api.structured.test", fixture);
        StructuredApiAdapter::new(
            "https://api.structured.test/v1/search",
            "key-123",
            Arc::new(transport),
        )
    }

    #[tokio::test]
    async fn test_parses_items_and_drops_incomplete() {
        let drafts = adapter(FIXTURE)
            .fetch("apple watch", &SearchOptions::default())
            .await;

        // Items without a title or positive price are dropped
        assert_eq!(drafts.len(), 2);

        let watch = &drafts[0];
        assert_eq!(watch.title, "Apple Watch Series 10");
        assert_eq!(watch.price, 399.0);
        assert_eq!(watch.rating, Some(4.7));
        assert_eq!(watch.review_count, Some(1523));
        assert_eq!(watch.brand.as_deref(), Some("Apple"));
        assert_eq!(watch.seller.as_deref(), Some("BestStore"));
        assert_eq!(watch.source, Source::StructuredApi);

        let band = &drafts[1];
        assert_eq!(band.price, 19.99);
    }

    #[tokio::test]
    async fn test_network_failure_is_empty() {
        let transport = StaticTransport::new(); // no routes
        let adapter = StructuredApiAdapter::new(
            "https://api.structured.test/v1/search",
            "key-123",
            Arc::new(transport),
        );
        let drafts = adapter.fetch("anything", &SearchOptions::default()).await;
        assert!(drafts.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_empty() {
        let drafts = adapter("<html>oops</html>")
            .fetch("apple watch", &SearchOptions::default())
            .await;
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_build_url_includes_price_bounds() {
        let adapter = adapter(FIXTURE);
        let options = SearchOptions {
            min_price: Some(10.0),
            max_price: Some(100.0),
            ..Default::default()
        };
        let url = adapter.build_url("watch", &options).unwrap();
        assert!(url.contains("min_price=10"));
        assert!(url.contains("max_price=100"));
        assert!(url.contains("q=watch"));
    }
}
