//! Query intent classification.
//!
//! Derives ephemeral hints (brand, category, price bounds) from the raw
//! query text. Intent only steers which adapters run and how the ranker
//! weights matches; it is never persisted and never affects correctness.

use regex::Regex;
use url::Url;

/// Ephemeral hints derived from a query string.
#[derive(Debug, Clone, Default)]
pub struct QueryIntent {
    /// True when the query names a brand, category, or model number
    pub specific: bool,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

const KNOWN_BRANDS: &[&str] = &[
    "apple", "samsung", "sony", "bose", "dyson", "nike", "adidas", "dell", "hp", "lenovo",
    "asus", "lg", "anker", "logitech", "garmin", "fitbit", "jbl", "philips", "canon", "nikon",
];

/// Keyword -> taxonomy bucket, first match wins.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("laptop", "electronics"),
    ("phone", "electronics"),
    ("tablet", "electronics"),
    ("headphone", "electronics"),
    ("earbud", "electronics"),
    ("speaker", "electronics"),
    ("watch", "electronics"),
    ("camera", "electronics"),
    ("monitor", "electronics"),
    ("keyboard", "electronics"),
    ("mouse", "electronics"),
    ("charger", "electronics"),
    ("tv", "electronics"),
    ("shoe", "fashion"),
    ("sneaker", "fashion"),
    ("shirt", "fashion"),
    ("jacket", "fashion"),
    ("dress", "fashion"),
    ("jeans", "fashion"),
    ("backpack", "fashion"),
    ("blender", "home"),
    ("vacuum", "home"),
    ("mattress", "home"),
    ("lamp", "home"),
    ("cookware", "home"),
    ("coffee", "home"),
    ("toy", "toys"),
    ("lego", "toys"),
    ("book", "books"),
    ("supplement", "health"),
    ("vitamin", "health"),
    ("dumbbell", "sports"),
    ("yoga", "sports"),
    ("bike", "sports"),
    ("tent", "sports"),
];

/// Whether the query is a direct product URL.
pub fn is_url(query: &str) -> bool {
    match Url::parse(query.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// Infer a taxonomy bucket from free text (query or product title).
pub fn infer_category(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, category)| category.to_string())
}

impl QueryIntent {
    /// Classify a free-text query.
    pub fn classify(query: &str) -> Self {
        let lower = query.to_lowercase();

        let brand = KNOWN_BRANDS
            .iter()
            .find(|b| {
                lower
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == **b)
            })
            .map(|b| b.to_string());

        let category = infer_category(&lower);

        let (min_price, max_price) = parse_price_hints(&lower);

        // Model numbers ("wh-1000xm5", "s24") read as specific too
        let has_model_number = lower
            .split_whitespace()
            .any(|w| w.chars().any(|c| c.is_ascii_digit()) && w.chars().any(|c| c.is_alphabetic()));

        let specific = brand.is_some() || category.is_some() || has_model_number;

        Self {
            specific,
            brand,
            category,
            min_price,
            max_price,
        }
    }

    /// Terms the ranker should weight, beyond the raw query words.
    pub fn bonus_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        if let Some(ref brand) = self.brand {
            terms.push(brand.clone());
        }
        if let Some(ref category) = self.category {
            terms.push(category.clone());
        }
        terms
    }
}

/// Parse "under $50", "over $100", and "$20-$40" style hints.
fn parse_price_hints(lower: &str) -> (Option<f64>, Option<f64>) {
    // Range first, so "between $20 and $40" never half-matches
    let range = Regex::new(r"\$?(\d+(?:\.\d+)?)\s*(?:-|to|and)\s*\$\s*?(\d+(?:\.\d+)?)")
        .expect("static regex");
    if let Some(caps) = range.captures(lower) {
        let lo = caps[1].parse::<f64>().ok();
        let hi = caps[2].parse::<f64>().ok();
        if let (Some(lo), Some(hi)) = (lo, hi) {
            if lo <= hi {
                return (Some(lo), Some(hi));
            }
        }
    }

    let upper = Regex::new(r"(?:under|below|less than|max|up to)\s*\$?\s*(\d+(?:\.\d+)?)")
        .expect("static regex");
    let lower_bound = Regex::new(r"(?:over|above|more than|at least|min)\s*\$?\s*(\d+(?:\.\d+)?)")
        .expect("static regex");

    let max = upper
        .captures(lower)
        .and_then(|c| c[1].parse::<f64>().ok());
    let min = lower_bound
        .captures(lower)
        .and_then(|c| c[1].parse::<f64>().ok());

    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_detection() {
        assert!(is_url("https://shop.example.com/p/watch-123"));
        assert!(is_url("http://example.com"));
        assert!(!is_url("apple watch"));
        assert!(!is_url("watch for under $50"));
        assert!(!is_url("ftp://example.com/file"));
    }

    #[test]
    fn test_brand_and_category() {
        let intent = QueryIntent::classify("Apple watch for running");
        assert_eq!(intent.brand.as_deref(), Some("apple"));
        assert_eq!(intent.category.as_deref(), Some("electronics"));
        assert!(intent.specific);
    }

    #[test]
    fn test_brand_requires_whole_word() {
        // "pineapple" must not match "apple"
        let intent = QueryIntent::classify("pineapple slicer");
        assert_eq!(intent.brand, None);
    }

    #[test]
    fn test_price_under() {
        let intent = QueryIntent::classify("headphones under $50");
        assert_eq!(intent.max_price, Some(50.0));
        assert_eq!(intent.min_price, None);
    }

    #[test]
    fn test_price_range() {
        let intent = QueryIntent::classify("backpack $20 to $40");
        assert_eq!(intent.min_price, Some(20.0));
        assert_eq!(intent.max_price, Some(40.0));
    }

    #[test]
    fn test_vague_query() {
        let intent = QueryIntent::classify("something nice");
        assert!(!intent.specific);
        assert!(intent.brand.is_none());
        assert!(intent.category.is_none());
    }

    #[test]
    fn test_model_number_is_specific() {
        let intent = QueryIntent::classify("wh-1000xm5");
        assert!(intent.specific);
    }

    #[test]
    fn test_bonus_terms() {
        let intent = QueryIntent::classify("sony headphones");
        let terms = intent.bonus_terms();
        assert!(terms.contains(&"sony".to_string()));
        assert!(terms.contains(&"electronics".to_string()));
    }
}
