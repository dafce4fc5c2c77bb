//! Non-destructive enrichment of draft records.
//!
//! One batched, index-addressed generation request covers all surviving
//! drafts. Whatever comes back is validated strictly and patched onto the
//! drafts; ground-truth fields (name, price, rating, review count,
//! availability, product URL) are set once from the draft and never
//! touched. A missing or unparseable item falls back to heuristic
//! defaults — enrichment failure never drops a product that had a valid
//! draft.

use crate::adapters::DetailAdapter;
use crate::intent::infer_category;
use crate::types::{
    canonical_id, CanonicalProduct, DraftRecord, SampleReview, Sentiment, Source,
};
use chrono::{NaiveDate, Utc};
use futures::StreamExt;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use shopscout_provider::ProviderBroker;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Generated narrative for one draft, index-addressed into the batch.
///
/// Deliberately has no fields for ground truth, so a hallucinated price or
/// rating cannot even be represented, let alone merged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentItem {
    pub index: usize,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub review_summary: Option<String>,
    #[serde(default)]
    pub sample_reviews: Vec<SampleReview>,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// Enricher over the provider broker, with optional detail hydration.
pub struct Enricher {
    broker: Arc<ProviderBroker>,
    detail: Option<Arc<DetailAdapter>>,
    detail_concurrency: usize,
}

impl Enricher {
    pub fn new(broker: Arc<ProviderBroker>) -> Self {
        Self {
            broker,
            detail: None,
            detail_concurrency: 4,
        }
    }

    /// Enable per-product detail hydration for lightweight-search drafts.
    pub fn with_detail_hydration(mut self, detail: Arc<DetailAdapter>, concurrency: usize) -> Self {
        self.detail = Some(detail);
        self.detail_concurrency = concurrency.max(1);
        self
    }

    /// Enrich all drafts into canonical products. Infallible: provider
    /// exhaustion or malformed output degrades to heuristic defaults.
    pub async fn enrich(&self, drafts: Vec<DraftRecord>, query: &str) -> Vec<CanonicalProduct> {
        if drafts.is_empty() {
            return Vec::new();
        }

        let drafts = self.hydrate(drafts).await;

        let prompt = build_batch_prompt(&drafts, query);
        let generated: HashMap<usize, EnrichmentItem> =
            match self.broker.generate_json::<Vec<EnrichmentItem>>(&prompt).await {
                Ok(items) => items.into_iter().map(|item| (item.index, item)).collect(),
                Err(err) => {
                    tracing::warn!(error = %err, "Batch enrichment failed, using heuristic defaults");
                    HashMap::new()
                }
            };

        drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| to_canonical(draft, generated.get(&i), query))
            .collect()
    }

    /// Hydrate lightweight-search drafts with page detail, bounded
    /// concurrency so latency tracks the slowest single fetch. Only fills
    /// fields the draft is missing; ground truth stays as fetched.
    async fn hydrate(&self, drafts: Vec<DraftRecord>) -> Vec<DraftRecord> {
        let Some(detail) = self.detail.clone() else {
            return drafts;
        };

        futures::stream::iter(drafts.into_iter().map(|mut draft| {
            let detail = Arc::clone(&detail);
            async move {
                let wants_more = draft.source == Source::WebSearch
                    && (draft.image.is_none() || draft.specifications.is_none());
                let Some(url) = draft.product_url.clone().filter(|_| wants_more) else {
                    return draft;
                };

                match detail.fetch_detail(&url).await {
                    Ok(page) => {
                        if draft.image.is_none() {
                            draft.image = page.image;
                        }
                        if draft.specifications.is_none() {
                            draft.specifications = page.specifications;
                        }
                        if draft.brand.is_none() {
                            draft.brand = page.brand;
                        }
                        if draft.availability.is_none() {
                            draft.availability = page.availability;
                        }
                    }
                    Err(err) => {
                        tracing::debug!(url, error = %err, "Detail hydration skipped");
                    }
                }
                draft
            }
        }))
        .buffered(self.detail_concurrency)
        .collect()
        .await
    }
}

/// One index-addressed request covering the whole batch.
fn build_batch_prompt(drafts: &[DraftRecord], query: &str) -> String {
    let mut listing = String::new();
    for (i, draft) in drafts.iter().enumerate() {
        listing.push_str(&format!(
            "{}. title: {} | brand: {} | price: {:.2} | rating: {}\n",
            i,
            draft.title,
            draft.brand.as_deref().unwrap_or("unknown"),
            draft.price,
            draft
                .rating
                .map(|r| format!("{:.1}", r))
                .unwrap_or_else(|| "unknown".to_string()),
        ));
    }

    format!(
        "You are enriching product listings for the shopping query \"{query}\".\n\
         For each numbered product below, respond with a JSON array of objects with fields:\n\
         index (the product number), category, features (3-5 strings), pros (2-4 strings),\n\
         cons (1-3 strings), sentiment (positive|neutral|negative), sentimentScore (0-100),\n\
         description (one paragraph), specifications (object of string pairs),\n\
         reviewSummary (one sentence), sampleReviews (2 objects with rating, text, reviewer, date),\n\
         videoUrl (optional).\n\
         Respond with only the JSON array.\n\nProducts:\n{listing}"
    )
}

/// Assemble the canonical product: ground truth from the draft, narrative
/// from the generated item or heuristics.
fn to_canonical(
    draft: DraftRecord,
    generated: Option<&EnrichmentItem>,
    query: &str,
) -> CanonicalProduct {
    let rating = draft.rating.unwrap_or(4.0);
    let review_count = draft.review_count.unwrap_or(0);
    let availability = draft
        .availability
        .clone()
        .unwrap_or_else(|| "In Stock".to_string());
    let in_stock = !availability.to_lowercase().contains("out of stock")
        && !availability.to_lowercase().contains("unavailable");

    let heuristic_sentiment = Sentiment::from_rating(rating);
    let heuristic_score = ((rating / 5.0) * 100.0).round().clamp(0.0, 100.0) as u8;

    let sentiment = generated
        .and_then(|g| g.sentiment.as_deref())
        .and_then(Sentiment::parse)
        .unwrap_or(heuristic_sentiment);
    let sentiment_score = generated
        .and_then(|g| g.sentiment_score)
        .map(|s| s.clamp(0.0, 100.0) as u8)
        .unwrap_or(heuristic_score);

    let category = generated
        .and_then(|g| g.category.clone())
        .or_else(|| infer_category(&draft.title))
        .or_else(|| infer_category(query))
        .unwrap_or_else(|| "general".to_string());

    let features = generated
        .map(|g| g.features.clone())
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| default_features(&draft.title));
    let pros = generated
        .map(|g| g.pros.clone())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| default_pros(rating));
    let cons = generated
        .map(|g| g.cons.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| vec!["Limited information available".to_string()]);

    let description = generated
        .and_then(|g| g.description.clone())
        .unwrap_or_else(|| format!("{} available for ${:.2}.", draft.title, draft.price));
    let review_summary = generated
        .and_then(|g| g.review_summary.clone())
        .unwrap_or_else(|| {
            format!(
                "Rated {:.1} out of 5 by {} reviewers.",
                rating, review_count
            )
        });
    let sample_reviews: Vec<SampleReview> = generated
        .map(|g| {
            g.sample_reviews
                .iter()
                .map(|r| SampleReview {
                    date: normalize_review_date(&r.date),
                    ..r.clone()
                })
                .collect()
        })
        .unwrap_or_default();
    let video_url = generated.and_then(|g| g.video_url.clone());

    // Generated specs only fill in where the draft had none
    let specifications = draft.specifications.clone().unwrap_or_else(|| {
        generated
            .map(|g| g.specifications.clone())
            .unwrap_or_default()
    });

    let brand = draft
        .brand
        .clone()
        .unwrap_or_else(|| brand_from_title(&draft.title));
    let image = draft
        .image
        .clone()
        .unwrap_or_else(|| fallback_image(&draft.title));

    CanonicalProduct {
        id: canonical_id(draft.source, &draft.title, draft.product_url.as_deref()),
        name: draft.title,
        price: draft.price,
        original_price: draft.original_price,
        image,
        rating,
        review_count,
        brand,
        category,
        features,
        pros,
        cons,
        sentiment,
        sentiment_score,
        description,
        in_stock,
        availability,
        specifications,
        video_url,
        review_summary,
        sample_reviews,
        source: draft.source,
        product_url: draft.product_url,
        seller: draft.seller,
        shipping: draft.shipping,
    }
}

fn default_features(title: &str) -> Vec<String> {
    vec![
        format!("{} with dependable everyday performance", title),
        "Solid build quality".to_string(),
        "Straightforward setup".to_string(),
    ]
}

fn default_pros(rating: f64) -> Vec<String> {
    if rating >= 4.0 {
        vec![
            "Well reviewed by buyers".to_string(),
            "Good value for the price".to_string(),
        ]
    } else {
        vec!["Competitive price".to_string()]
    }
}

/// Generated review dates arrive as free text; anything that is not an
/// ISO date is replaced with today's.
fn normalize_review_date(raw: &str) -> String {
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        raw.to_string()
    } else {
        Utc::now().format("%Y-%m-%d").to_string()
    }
}

/// First capitalized word is usually the brand in marketplace titles.
fn brand_from_title(title: &str) -> String {
    title
        .split_whitespace()
        .next()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        .map(String::from)
        .unwrap_or_else(|| "Generic".to_string())
}

const FALLBACK_IMAGES: &[&str] = &[
    "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=600",
    "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=600",
    "https://images.unsplash.com/photo-1526170375885-4d8ecf77b99f?w=600",
    "https://images.unsplash.com/photo-1572635196237-14b3f281503f?w=600",
    "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=600",
];

/// Deterministic hash-of-title selection, so identical inputs reproduce.
pub fn fallback_image(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    let index = digest[0] as usize % FALLBACK_IMAGES.len();
    FALLBACK_IMAGES[index].to_string()
}
