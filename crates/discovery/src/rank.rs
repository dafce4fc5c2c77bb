//! Relevance ranking and near-duplicate collapse for draft records.
//!
//! Drafts from different adapters frequently describe the same listing.
//! The dedup key is the normalized title plus a 1%-wide price bucket; a
//! collision keeps the better-reviewed draft. Survivors are scored by
//! query-term overlap, rating, and review volume, then stably sorted.

use crate::intent::QueryIntent;
use crate::types::DraftRecord;
use std::collections::HashMap;

/// Lowercase, strip punctuation, collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_space = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Bucket a price into 1%-wide logarithmic bands, so two listings of the
/// same item whose prices differ by under ~1% collide.
pub fn price_bucket(price: f64) -> i64 {
    (price.max(0.01).ln() / 0.01).round() as i64
}

fn dedup_key(draft: &DraftRecord) -> (String, i64) {
    (normalize_title(&draft.title), price_bucket(draft.price))
}

/// Relevance score for one draft.
///
/// Σ len(term) over terms found as substrings of the normalized title,
/// plus rating×10, plus log-scaled review volume capped at 10.
pub fn score(draft: &DraftRecord, terms: &[String]) -> f64 {
    let title = normalize_title(&draft.title);

    let term_score: f64 = terms
        .iter()
        .filter(|term| title.contains(term.as_str()))
        .map(|term| term.len() as f64)
        .sum();

    let rating_score = draft.rating.unwrap_or(0.0) * 10.0;
    let volume_score = (f64::from(draft.review_count.unwrap_or(0))).ln_1p().min(10.0);

    term_score + rating_score + volume_score
}

/// Terms worth matching: normalized query words of 2+ chars plus intent
/// bonus terms (brand, category).
fn build_terms(query: &str, intent: &QueryIntent) -> Vec<String> {
    let mut terms: Vec<String> = normalize_title(query)
        .split_whitespace()
        .filter(|w| w.len() >= 2)
        .map(String::from)
        .collect();
    for bonus in intent.bonus_terms() {
        if !terms.contains(&bonus) {
            terms.push(bonus);
        }
    }
    terms
}

/// Collapse near-duplicates, score, stably sort descending, truncate.
pub fn rank(
    drafts: Vec<DraftRecord>,
    query: &str,
    intent: &QueryIntent,
    max_results: usize,
) -> Vec<DraftRecord> {
    let total = drafts.len();

    // Dedup preserving first-seen position for each key
    let mut slots: Vec<DraftRecord> = Vec::with_capacity(drafts.len());
    let mut by_key: HashMap<(String, i64), usize> = HashMap::new();

    for draft in drafts {
        let key = dedup_key(&draft);
        match by_key.get(&key) {
            Some(&slot) => {
                if beats(&draft, &slots[slot]) {
                    slots[slot] = draft;
                }
            }
            None => {
                by_key.insert(key, slots.len());
                slots.push(draft);
            }
        }
    }

    if slots.len() < total {
        tracing::debug!(collapsed = total - slots.len(), "Collapsed near-duplicate drafts");
    }

    // Stable sort: equal scores preserve original relative order
    let terms = build_terms(query, intent);
    let mut scored: Vec<(f64, DraftRecord)> = slots
        .into_iter()
        .map(|draft| (score(&draft, &terms), draft))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(max_results)
        .map(|(_, draft)| draft)
        .collect()
}

/// Collision winner: higher rating, then higher review count, then earlier
/// adapter priority.
fn beats(challenger: &DraftRecord, incumbent: &DraftRecord) -> bool {
    let c_rating = challenger.rating.unwrap_or(0.0);
    let i_rating = incumbent.rating.unwrap_or(0.0);
    if c_rating != i_rating {
        return c_rating > i_rating;
    }

    let c_reviews = challenger.review_count.unwrap_or(0);
    let i_reviews = incumbent.review_count.unwrap_or(0);
    if c_reviews != i_reviews {
        return c_reviews > i_reviews;
    }

    challenger.source.priority() < incumbent.source.priority()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn draft(title: &str, price: f64, rating: f64, reviews: u32, source: Source) -> DraftRecord {
        let mut d = DraftRecord::new(title, price, source);
        d.rating = Some(rating);
        d.review_count = Some(reviews);
        d
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("Apple Watch — Series 10 (GPS)"),
            "apple watch series 10 gps"
        );
        assert_eq!(normalize_title("  Lots   of---space "), "lots of space");
    }

    #[test]
    fn test_price_bucket_within_one_percent() {
        assert_eq!(price_bucket(100.0), price_bucket(100.4));
        assert_ne!(price_bucket(100.0), price_bucket(103.0));
    }

    #[test]
    fn test_dedup_keeps_higher_rating() {
        let a = draft("Apple Watch SE", 249.0, 4.2, 100, Source::WebSearch);
        let b = draft("Apple  Watch SE!", 250.0, 4.6, 50, Source::StructuredApi);

        let intent = QueryIntent::default();
        let out = rank(vec![a, b], "apple watch", &intent, 10);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rating, Some(4.6));
    }

    #[test]
    fn test_dedup_tie_breaks_on_reviews_then_priority() {
        let a = draft("Apple Watch SE", 249.0, 4.5, 100, Source::WebSearch);
        let b = draft("Apple Watch SE", 249.0, 4.5, 300, Source::WebSearch);
        let intent = QueryIntent::default();
        let out = rank(vec![a, b], "watch", &intent, 10);
        assert_eq!(out[0].review_count, Some(300));

        let c = draft("Apple Watch SE", 249.0, 4.5, 300, Source::WebSearch);
        let d = draft("Apple Watch SE", 249.0, 4.5, 300, Source::StructuredApi);
        let out = rank(vec![c, d], "watch", &intent, 10);
        assert_eq!(out[0].source, Source::StructuredApi);
    }

    #[test]
    fn test_no_two_outputs_share_key() {
        let drafts = vec![
            draft("Apple Watch SE", 249.0, 4.2, 10, Source::WebSearch),
            draft("apple watch se", 250.0, 4.4, 20, Source::StructuredApi),
            draft("Watch Band", 19.99, 4.0, 5, Source::WebSearch),
        ];
        let out = rank(drafts, "apple watch", &QueryIntent::default(), 10);
        let mut keys: Vec<_> = out.iter().map(dedup_key).collect();
        let before = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), before);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_term_overlap_outranks() {
        let matching = draft("Apple Watch Series 10", 399.0, 4.0, 100, Source::WebSearch);
        let unrelated = draft("Kitchen Blender", 399.0, 4.0, 100, Source::WebSearch);

        let intent = QueryIntent::classify("apple watch");
        let out = rank(vec![unrelated, matching], "apple watch", &intent, 10);
        assert_eq!(out[0].title, "Apple Watch Series 10");
    }

    #[test]
    fn test_rating_and_volume_break_equal_overlap() {
        let better = draft("Apple Watch A", 100.0, 4.8, 5000, Source::WebSearch);
        let worse = draft("Apple Watch B", 200.0, 4.1, 10, Source::WebSearch);

        let out = rank(
            vec![worse.clone(), better.clone()],
            "apple watch",
            &QueryIntent::default(),
            10,
        );
        assert_eq!(out[0].title, "Apple Watch A");
    }

    #[test]
    fn test_equal_scores_preserve_order() {
        let first = draft("Apple Watch A", 100.0, 4.0, 100, Source::WebSearch);
        let second = draft("Apple Watch B", 200.0, 4.0, 100, Source::WebSearch);

        let out = rank(
            vec![first, second],
            "apple watch",
            &QueryIntent::default(),
            10,
        );
        assert_eq!(out[0].title, "Apple Watch A");
        assert_eq!(out[1].title, "Apple Watch B");
    }

    #[test]
    fn test_truncates_to_max_results() {
        let drafts: Vec<DraftRecord> = (0..10)
            .map(|i| draft(&format!("Watch {}", i), 50.0 + f64::from(i) * 10.0, 4.0, 10, Source::WebSearch))
            .collect();
        let out = rank(drafts, "watch", &QueryIntent::default(), 3);
        assert_eq!(out.len(), 3);
    }
}
