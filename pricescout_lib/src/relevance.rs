//! Decides whether a listing name plausibly matches the search query.
//!
//! Deliberately lenient: a differently worded but genuine listing is worth more
//! than a perfectly clean result list.

use crate::candidate::PriceCandidate;
use crate::decompose::QueryDecomposition;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "buy", "best", "price", "prices", "online", "cheap", "new",
    "latest", "near", "from", "shop", "store", "sale", "deal", "deals", "offer", "under",
    "below", "above", "over",
];

/// Names containing any of these are kept even without a token match.
const GENERIC_MARKERS: &[&str] = &[
    "men", "women", "kids", "unisex", "phone", "mobile", "shirt", "shoe",
];

const APPLE_FAMILY: &[&str] = &["iphone", "ipad", "macbook"];

/// Query tokens that carry meaning: longer than two characters and not a stop word.
pub fn significant_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2 && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Whether `name` matches `query`, optionally anchored on an explicit `brand`.
pub fn is_relevant(name: &str, query: &str, brand: Option<&str>) -> bool {
    let name = name.to_lowercase();

    if let Some(brand) = brand.map(str::to_lowercase).filter(|b| !b.is_empty()) {
        if brand == "apple" || brand == "iphone" {
            return name.contains(&brand) || APPLE_FAMILY.iter().any(|m| name.contains(m));
        }
        return name.contains(&brand);
    }

    let tokens = significant_tokens(query);
    if tokens.is_empty() {
        return true;
    }
    tokens.iter().any(|t| name.contains(t.as_str()))
        || GENERIC_MARKERS.iter().any(|m| name.contains(m))
}

/// Keeps candidates whose name matches the decomposed query.
pub fn filter_relevant(
    candidates: Vec<PriceCandidate>,
    decomposition: &QueryDecomposition,
) -> Vec<PriceCandidate> {
    let before = candidates.len();
    let kept: Vec<PriceCandidate> = candidates
        .into_iter()
        .filter(|c| {
            is_relevant(
                &c.name,
                &decomposition.primary_query,
                decomposition.brand.as_deref(),
            )
        })
        .collect();
    if kept.len() < before {
        tracing::debug!(
            dropped = before - kept.len(),
            query = %decomposition.primary_query,
            "dropped irrelevant listings"
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_match_is_relevant() {
        assert!(is_relevant(
            "Samsung Galaxy S24 Ultra Case",
            "Samsung Galaxy S24",
            Some("samsung")
        ));
    }

    #[test]
    fn other_brand_is_not_relevant() {
        assert!(!is_relevant("iPhone 15 Case", "Samsung Galaxy S24", Some("samsung")));
    }

    #[test]
    fn apple_family_equivalence() {
        assert!(is_relevant("iPhone 15 Pro 256GB", "apple phone", Some("apple")));
        assert!(is_relevant("MacBook Air M3", "apple laptop", Some("apple")));
        assert!(is_relevant("Apple iPad 10th Gen", "iphone", Some("iphone")));
        assert!(!is_relevant("Galaxy Tab S9", "apple tablet", Some("apple")));
    }

    #[test]
    fn brand_match_is_case_insensitive() {
        assert!(is_relevant("ONEPLUS 12R", "oneplus 12r", Some("OnePlus")));
    }

    #[test]
    fn token_match_without_brand() {
        assert!(is_relevant("Full Length Wall Mirror", "wall mirror", None));
        assert!(!is_relevant("Ceiling Fan 1200mm", "wall mirror", None));
    }

    #[test]
    fn generic_marker_fallback() {
        assert!(is_relevant("Classic Fit Shirt for Men", "formal kurta", None));
    }

    #[test]
    fn no_tokens_defaults_to_relevant() {
        assert!(is_relevant("Anything", "tv", None));
        assert!(is_relevant("Anything", "the best", None));
    }

    #[test]
    fn tokens_drop_short_and_stop_words() {
        assert_eq!(
            significant_tokens("Buy the best LED TV for bedroom"),
            vec!["led", "bedroom"]
        );
    }
}
