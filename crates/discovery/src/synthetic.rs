//! Fully generative catalog fallback.
//!
//! Used only when the caller explicitly opts out of real data (the guided-
//! quiz flow) — never as a silent substitute for empty real results. All
//! output is tagged `synthetic` with ids in a namespace no real adapter
//! emits, and a parse failure yields an empty list, which callers must
//! treat as a valid outcome.

use crate::enrich::fallback_image;
use crate::intent::infer_category;
use crate::types::{synthetic_id, CanonicalProduct, SampleReview, Sentiment, Source};
use serde::Deserialize;
use shopscout_provider::ProviderBroker;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One generated listing, same field shape as the canonical product minus
/// provenance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyntheticListing {
    name: String,
    price: f64,
    #[serde(default)]
    original_price: Option<f64>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    pros: Vec<String>,
    #[serde(default)]
    cons: Vec<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    review_count: Option<u32>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    sentiment_score: Option<f64>,
    #[serde(default)]
    specifications: BTreeMap<String, String>,
    #[serde(default)]
    review_summary: Option<String>,
    #[serde(default)]
    sample_reviews: Vec<SampleReview>,
}

/// Generator for the explicit synthetic path.
pub struct SyntheticCatalog {
    broker: Arc<ProviderBroker>,
}

impl SyntheticCatalog {
    pub fn new(broker: Arc<ProviderBroker>) -> Self {
        Self { broker }
    }

    /// Generate up to `max_results` plausible listings for the query.
    pub async fn generate(&self, query: &str, max_results: usize) -> Vec<CanonicalProduct> {
        let prompt = build_prompt(query, max_results);

        let listings = match self
            .broker
            .generate_json::<Vec<SyntheticListing>>(&prompt)
            .await
        {
            Ok(listings) => listings,
            Err(err) => {
                tracing::warn!(error = %err, "Synthetic generation failed, returning empty catalog");
                return Vec::new();
            }
        };

        listings
            .into_iter()
            .filter(|l| !l.name.trim().is_empty() && l.price > 0.0)
            .take(max_results)
            .enumerate()
            .map(|(i, listing)| to_product(i, listing, query))
            .collect()
    }
}

fn build_prompt(query: &str, max_results: usize) -> String {
    format!(
        "Generate {max_results} realistic product listings for the shopping query \"{query}\".\n\
         Respond with only a JSON array of objects with fields: name, price (number),\n\
         originalPrice (optional number), brand, category, description, features (array),\n\
         pros (array), cons (array), rating (1-5), reviewCount (number),\n\
         sentiment (positive|neutral|negative), sentimentScore (0-100),\n\
         specifications (object of string pairs), reviewSummary,\n\
         sampleReviews (array of objects with rating, text, reviewer, date)."
    )
}

fn to_product(index: usize, listing: SyntheticListing, query: &str) -> CanonicalProduct {
    let rating = listing.rating.map(|r| r.clamp(1.0, 5.0)).unwrap_or(4.2);
    let review_count = listing.review_count.unwrap_or(0);
    let sentiment = listing
        .sentiment
        .as_deref()
        .and_then(Sentiment::parse)
        .unwrap_or_else(|| Sentiment::from_rating(rating));
    let sentiment_score = listing
        .sentiment_score
        .map(|s| s.clamp(0.0, 100.0) as u8)
        .unwrap_or(((rating / 5.0) * 100.0).round() as u8);

    CanonicalProduct {
        id: synthetic_id(index, &listing.name),
        image: fallback_image(&listing.name),
        name: listing.name.clone(),
        price: listing.price,
        original_price: listing.original_price.filter(|p| *p > listing.price),
        rating,
        review_count,
        brand: listing.brand.unwrap_or_else(|| "Generic".to_string()),
        category: listing
            .category
            .or_else(|| infer_category(&listing.name))
            .or_else(|| infer_category(query))
            .unwrap_or_else(|| "general".to_string()),
        features: listing.features,
        pros: listing.pros,
        cons: listing.cons,
        sentiment,
        sentiment_score,
        description: listing
            .description
            .unwrap_or_else(|| format!("A recommended pick for \"{}\".", query)),
        in_stock: true,
        availability: "In Stock".to_string(),
        specifications: listing.specifications,
        video_url: None,
        review_summary: listing
            .review_summary
            .unwrap_or_else(|| format!("Rated {:.1} out of 5.", rating)),
        sample_reviews: listing.sample_reviews,
        source: Source::Synthetic,
        product_url: None,
        seller: None,
        shipping: None,
    }
}
