//! Tolerant parsing of price, rating, and review-count text.
//!
//! Upstream payloads carry these as strings more often than numbers
//! ("$1,299.99", "2.3k ratings", "4.5 out of 5"). Parsing here prefers a
//! defaulted/clamped value over rejecting the record.

use regex::Regex;
use std::sync::OnceLock;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"))
}

/// Parse a price out of free text, stripping currency symbols and thousands
/// separators. Returns `None` when no positive number is present.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    // "1,299.99" -> "1299.99"
    let cleaned = cleaned.replace(',', "");

    let m = number_re().find(&cleaned)?;
    let value = m.as_str().parse::<f64>().ok()?;
    if value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Parse a review count, tolerating "1,234", "(456)", and "2.3k" shapes.
pub fn parse_review_count(text: &str) -> Option<u32> {
    let lower = text.to_lowercase();
    let cleaned = lower.replace(',', "");
    let m = number_re().find(&cleaned)?;
    let value = m.as_str().parse::<f64>().ok()?;

    let rest = &cleaned[m.end()..];
    let scaled = if rest.trim_start().starts_with('k') {
        value * 1_000.0
    } else if rest.trim_start().starts_with('m') {
        value * 1_000_000.0
    } else {
        value
    };

    if scaled >= 0.0 {
        Some(scaled.round() as u32)
    } else {
        None
    }
}

/// Parse a star rating, clamped to [1, 5]. Returns `None` only when no
/// number is present at all.
pub fn parse_rating(text: &str) -> Option<f64> {
    let m = number_re().find(text)?;
    let value = m.as_str().parse::<f64>().ok()?;
    Some(clamp_rating(value))
}

/// Clamp a rating into the valid [1, 5] band.
pub fn clamp_rating(value: f64) -> f64 {
    value.clamp(1.0, 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_currency_and_separators() {
        assert_eq!(parse_price("$1,299.99"), Some(1299.99));
        assert_eq!(parse_price("USD 49"), Some(49.0));
        assert_eq!(parse_price("€89.50"), Some(89.5));
        assert_eq!(parse_price("from $12.00"), Some(12.0));
    }

    #[test]
    fn test_parse_price_rejects_non_positive() {
        assert_eq!(parse_price("$0.00"), None);
        assert_eq!(parse_price("free"), None);
        assert_eq!(parse_price(""), None);
    }

    #[test]
    fn test_parse_review_count() {
        assert_eq!(parse_review_count("1,234 ratings"), Some(1234));
        assert_eq!(parse_review_count("(456)"), Some(456));
        assert_eq!(parse_review_count("2.3k"), Some(2300));
        assert_eq!(parse_review_count("1.2M reviews"), Some(1_200_000));
        assert_eq!(parse_review_count("no reviews yet"), None);
    }

    #[test]
    fn test_parse_rating_clamps() {
        assert_eq!(parse_rating("4.5 out of 5"), Some(4.5));
        assert_eq!(parse_rating("9.1"), Some(5.0));
        assert_eq!(parse_rating("0.2"), Some(1.0));
        assert_eq!(parse_rating("n/a"), None);
    }
}
