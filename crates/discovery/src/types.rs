//! Product data model for the discovery pipeline.
//!
//! Two shapes flow through the pipeline: the per-source partial
//! [`DraftRecord`] produced by adapters, and the fully-shaped, provenance-
//! tagged [`CanonicalProduct`] returned to callers. Wire names are camelCase
//! to match the chat front end that consumes them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Provenance tag: which channel produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// Paid structured shopping API
    #[serde(rename = "structured-api")]
    StructuredApi,

    /// Lightweight search/shopping results
    #[serde(rename = "web-search")]
    WebSearch,

    /// Single-URL product page fetch
    #[serde(rename = "direct-url")]
    DirectUrl,

    /// Fully generated listing
    #[serde(rename = "synthetic")]
    Synthetic,
}

impl Source {
    /// Stable string tag, also used as the id namespace prefix.
    pub fn tag(&self) -> &'static str {
        match self {
            Source::StructuredApi => "structured-api",
            Source::WebSearch => "web-search",
            Source::DirectUrl => "direct-url",
            Source::Synthetic => "synthetic",
        }
    }

    /// Adapter priority order, used as the final dedup tie-break.
    /// Lower is preferred.
    pub fn priority(&self) -> u8 {
        match self {
            Source::StructuredApi => 0,
            Source::WebSearch => 1,
            Source::DirectUrl => 2,
            Source::Synthetic => 3,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Source::Synthetic)
    }
}

/// Aggregate provenance classification for a whole response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    /// Every record came from a real channel
    #[serde(rename = "real_time")]
    RealTime,

    /// Real and synthetic records are mixed
    #[serde(rename = "mixed")]
    Mixed,

    /// Every record was generated
    #[serde(rename = "ai_generated")]
    AiGenerated,
}

impl DataSource {
    /// Classify a result set. `empty_default` is the classification of the
    /// path that was attempted, used when no records came back (an empty
    /// list is a valid response, and the caller still learns which path
    /// produced it).
    pub fn classify(records: &[CanonicalProduct], empty_default: DataSource) -> DataSource {
        if records.is_empty() {
            return empty_default;
        }
        let synthetic = records.iter().filter(|r| r.source.is_synthetic()).count();
        if synthetic == records.len() {
            DataSource::AiGenerated
        } else if synthetic == 0 {
            DataSource::RealTime
        } else {
            DataSource::Mixed
        }
    }
}

/// Partial, source-specific product data before normalization/enrichment.
///
/// Produced by exactly one adapter. Essential fields are a non-empty title
/// and a positive price; a draft missing either is discarded before ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRecord {
    pub title: String,
    pub price: f64,
    pub original_price: Option<f64>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub brand: Option<String>,
    pub availability: Option<String>,
    pub source: Source,
    pub product_url: Option<String>,
    pub seller: Option<String>,
    pub shipping: Option<String>,
    pub specifications: Option<BTreeMap<String, String>>,
}

impl DraftRecord {
    /// Minimal draft for a source; everything else defaults to absent.
    pub fn new(title: impl Into<String>, price: f64, source: Source) -> Self {
        Self {
            title: title.into(),
            price,
            original_price: None,
            image: None,
            rating: None,
            review_count: None,
            brand: None,
            availability: None,
            source,
            product_url: None,
            seller: None,
            shipping: None,
            specifications: None,
        }
    }

    /// Whether this draft carries the essential fields.
    pub fn is_viable(&self) -> bool {
        !self.title.trim().is_empty() && self.price > 0.0
    }
}

/// Overall review sentiment bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Sentiment derived purely from a star rating, used when no generated
    /// narrative is available: <3 negative, 3-3.9 neutral, >=4 positive.
    pub fn from_rating(rating: f64) -> Self {
        if rating < 3.0 {
            Sentiment::Negative
        } else if rating < 4.0 {
            Sentiment::Neutral
        } else {
            Sentiment::Positive
        }
    }

    /// Lenient parse of generated sentiment text.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

/// A generated or extracted sample review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleReview {
    pub rating: f64,
    pub text: String,
    pub reviewer: String,
    pub date: String,
}

/// The fully-shaped, provenance-tagged record returned to callers.
///
/// Ground-truth fields (name, price, rating, reviewCount, availability,
/// productUrl) are set once from the draft; enrichment only fills derived
/// and narrative fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalProduct {
    /// Opaque id, namespaced by source tag
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub image: String,
    pub rating: f64,
    pub review_count: u32,
    pub brand: String,
    pub category: String,
    pub features: Vec<String>,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub sentiment: Sentiment,
    pub sentiment_score: u8,
    pub description: String,
    pub in_stock: bool,
    pub availability: String,
    pub specifications: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub review_summary: String,
    pub sample_reviews: Vec<SampleReview>,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<String>,
}

/// Options for one `search` call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// When false, skip real-data adapters entirely and generate a
    /// synthetic catalog (e.g., the guided-quiz flow).
    pub use_real_data: bool,
    pub max_results: usize,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            use_real_data: true,
            max_results: 6,
            min_price: None,
            max_price: None,
        }
    }
}

/// Response envelope for one `search` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub records: Vec<CanonicalProduct>,
    pub data_source: DataSource,
}

/// Build an opaque id in the source's namespace. Deterministic for a given
/// title/url pair so identical inputs reproduce in tests.
pub fn canonical_id(source: Source, title: &str, url: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    if let Some(url) = url {
        hasher.update(url.as_bytes());
    }
    let digest = hasher.finalize();
    let hex: String = digest[..5].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", source.tag(), hex)
}

/// Synthetic ids live in a namespace no real adapter ever emits.
pub fn synthetic_id(index: usize, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
    format!("syn-{}-{}", index, hex)
}
