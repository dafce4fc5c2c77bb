//! Adapter for direct product-page fetches.
//!
//! Given a single product URL, extracts one draft from the page HTML.
//! Extraction tries the most reliable signals first: JSON-LD `Product`
//! blocks, then OpenGraph/meta tags, then a list of CSS-selector
//! candidates per field. Fragile selector heuristics all live here, tested
//! against recorded fixture pages.

use crate::adapters::{settle, SourceAdapter};
use crate::price::{clamp_rating, parse_price, parse_review_count};
use crate::transport::Transport;
use crate::types::{DraftRecord, SearchOptions, Source};
use scraper::{Html, Selector};
use serde_json::Value;
use shopscout_core::{AppError, AppResult};
use std::sync::Arc;

pub struct DetailAdapter {
    transport: Arc<dyn Transport>,
}

const TITLE_SELECTORS: &[&str] = &[
    "h1[itemprop='name']",
    "#productTitle",
    ".product-title",
    ".product-name h1",
    "h1",
];

const PRICE_SELECTORS: &[&str] = &[
    "[itemprop='price']",
    ".a-price .a-offscreen",
    ".price-current",
    ".product-price",
    ".price",
];

const RATING_SELECTORS: &[&str] = &["[itemprop='ratingValue']", ".rating-value", ".star-rating"];

const REVIEW_COUNT_SELECTORS: &[&str] = &[
    "[itemprop='reviewCount']",
    "#acrCustomerReviewText",
    ".review-count",
];

const AVAILABILITY_SELECTORS: &[&str] = &[
    "[itemprop='availability']",
    "#availability span",
    ".availability",
    ".stock-status",
];

impl DetailAdapter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch and extract one draft from a product page. Used both for the
    /// direct-URL query path and for hydrating lightweight-search drafts.
    pub async fn fetch_detail(&self, url: &str) -> AppResult<DraftRecord> {
        let html = self.transport.fetch_text(url).await?;
        extract_draft(url, &html)
            .ok_or_else(|| AppError::SourceUnavailable(format!("No product data in {}", url)))
    }
}

#[async_trait::async_trait]
impl SourceAdapter for DetailAdapter {
    fn source(&self) -> Source {
        Source::DirectUrl
    }

    async fn fetch(&self, query: &str, _options: &SearchOptions) -> Vec<DraftRecord> {
        tracing::info!(url = query, "Fetching product detail page");
        let result = self.fetch_detail(query).await.map(|d| vec![d]);
        settle(self.source(), result)
    }
}

/// Extract a draft from page HTML; `None` when no title/price is found.
fn extract_draft(url: &str, html: &str) -> Option<DraftRecord> {
    let document = Html::parse_document(html);

    let json_ld = extract_json_ld_product(&document);

    let title = json_ld
        .as_ref()
        .and_then(|p| p.get("name").and_then(Value::as_str).map(String::from))
        .or_else(|| meta_content(&document, "og:title"))
        .or_else(|| select_text(&document, TITLE_SELECTORS))?;

    let price = json_ld
        .as_ref()
        .and_then(json_ld_price)
        .or_else(|| {
            meta_content(&document, "product:price:amount").and_then(|s| parse_price(&s))
        })
        .or_else(|| select_price(&document))?;

    let mut draft = DraftRecord::new(title, price, Source::DirectUrl);
    draft.product_url = Some(url.to_string());

    draft.image = json_ld
        .as_ref()
        .and_then(json_ld_image)
        .or_else(|| meta_content(&document, "og:image"));

    draft.brand = json_ld.as_ref().and_then(|p| {
        p.pointer("/brand/name")
            .or_else(|| p.get("brand"))
            .and_then(Value::as_str)
            .map(String::from)
    });

    draft.rating = json_ld
        .as_ref()
        .and_then(|p| {
            p.pointer("/aggregateRating/ratingValue")
                .and_then(value_as_f64)
        })
        .or_else(|| select_text(&document, RATING_SELECTORS).and_then(|t| parse_price(&t)))
        .map(clamp_rating);

    draft.review_count = json_ld
        .as_ref()
        .and_then(|p| {
            p.pointer("/aggregateRating/reviewCount")
                .and_then(value_as_f64)
                .map(|v| v as u32)
        })
        .or_else(|| {
            select_text(&document, REVIEW_COUNT_SELECTORS).and_then(|t| parse_review_count(&t))
        });

    draft.availability = json_ld
        .as_ref()
        .and_then(|p| {
            p.pointer("/offers/availability")
                .and_then(Value::as_str)
                .map(humanize_availability)
        })
        .or_else(|| select_text(&document, AVAILABILITY_SELECTORS));

    Some(draft)
}

/// First JSON-LD block with `@type: Product`, searching `@graph` too.
fn extract_json_ld_product(document: &Html) -> Option<Value> {
    let selector = Selector::parse("script[type='application/ld+json']").ok()?;

    for script in document.select(&selector) {
        let text: String = script.text().collect();
        let Ok(data) = serde_json::from_str::<Value>(&text) else {
            continue;
        };

        let candidates: Vec<&Value> = match &data {
            Value::Array(items) => items.iter().collect(),
            Value::Object(obj) => match obj.get("@graph").and_then(Value::as_array) {
                Some(graph) => graph.iter().collect(),
                None => vec![&data],
            },
            _ => continue,
        };

        for candidate in candidates {
            let is_product = candidate
                .get("@type")
                .map(|t| match t {
                    Value::String(s) => s == "Product",
                    Value::Array(a) => a.iter().any(|v| v.as_str() == Some("Product")),
                    _ => false,
                })
                .unwrap_or(false);
            if is_product {
                return Some(candidate.clone());
            }
        }
    }
    None
}

fn json_ld_price(product: &Value) -> Option<f64> {
    let offers = product.get("offers")?;
    let offer = match offers {
        Value::Array(a) => a.first()?,
        other => other,
    };
    offer
        .get("price")
        .or_else(|| offer.pointer("/priceSpecification/price"))
        .and_then(value_as_f64)
        .filter(|v| *v > 0.0)
}

fn json_ld_image(product: &Value) -> Option<String> {
    match product.get("image")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(a) => a.first().and_then(Value::as_str).map(String::from),
        Value::Object(o) => o.get("url").and_then(Value::as_str).map(String::from),
        _ => None,
    }
}

/// Numbers in JSON-LD arrive as numbers or strings interchangeably.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().or_else(|| parse_price(s)),
        _ => None,
    }
}

fn meta_content(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(
        "meta[property='{}'], meta[name='{}']",
        property, property
    ))
    .ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(el) = document.select(&selector).next() {
            // content attr (itemprop meta patterns) wins over text
            if let Some(content) = el.value().attr("content") {
                if !content.trim().is_empty() {
                    return Some(content.trim().to_string());
                }
            }
            let text: String = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn select_price(document: &Html) -> Option<f64> {
    select_text(document, PRICE_SELECTORS).and_then(|t| parse_price(&t))
}

fn humanize_availability(schema: &str) -> String {
    if schema.contains("OutOfStock") {
        "Out of Stock".to_string()
    } else if schema.contains("InStock") {
        "In Stock".to_string()
    } else {
        schema.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fixtures::StaticTransport;

    const JSON_LD_PAGE: &str = r#"<html><head>
        <script type="application/ld+json">
        {
            "@context": "https://schema.org",
            "@type": "Product",
            "name": "Sony WH-1000XM5 Headphones",
            "image": ["https://img.test/xm5.jpg"],
            "brand": {"@type": "Brand", "name": "Sony"},
            "offers": {"@type": "Offer", "price": "348.00", "availability": "https://schema.org/InStock"},
            "aggregateRating": {"ratingValue": "4.8", "reviewCount": "3412"}
        }
        </script>
        </head><body><h1>Sony WH-1000XM5 Headphones</h1></body></html>"#;

    const SELECTOR_PAGE: &str = r#"<html><head>
        <meta property="og:image" content="https://img.test/fallback.jpg">
        </head><body>
        <h1 class="product-title">Generic Smart Watch</h1>
        <span class="price">$59.99</span>
        <span class="availability">Out of Stock</span>
        </body></html>"#;

    const EMPTY_PAGE: &str = "<html><body><p>404 not found</p></body></html>";

    fn adapter(url: &str, page: &str) -> DetailAdapter {
        let transport = StaticTransport::new().route(url, page);
        DetailAdapter::new(Arc::new(transport))
    }

    #[tokio::test]
    async fn test_json_ld_extraction() {
        let url = "https://shop.test/xm5";
        let drafts = adapter(url, JSON_LD_PAGE)
            .fetch(url, &SearchOptions::default())
            .await;

        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.title, "Sony WH-1000XM5 Headphones");
        assert_eq!(draft.price, 348.0);
        assert_eq!(draft.brand.as_deref(), Some("Sony"));
        assert_eq!(draft.rating, Some(4.8));
        assert_eq!(draft.review_count, Some(3412));
        assert_eq!(draft.availability.as_deref(), Some("In Stock"));
        assert_eq!(draft.source, Source::DirectUrl);
        assert_eq!(draft.product_url.as_deref(), Some(url));
    }

    #[tokio::test]
    async fn test_selector_fallback() {
        let url = "https://shop.test/generic";
        let drafts = adapter(url, SELECTOR_PAGE)
            .fetch(url, &SearchOptions::default())
            .await;

        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.title, "Generic Smart Watch");
        assert_eq!(draft.price, 59.99);
        assert_eq!(draft.image.as_deref(), Some("https://img.test/fallback.jpg"));
        assert_eq!(draft.availability.as_deref(), Some("Out of Stock"));
    }

    #[tokio::test]
    async fn test_page_without_product_is_empty() {
        let url = "https://shop.test/missing";
        let drafts = adapter(url, EMPTY_PAGE)
            .fetch(url, &SearchOptions::default())
            .await;
        assert!(drafts.is_empty());
    }
}
