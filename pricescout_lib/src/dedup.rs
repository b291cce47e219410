//! Collapses listings re-found by several search variations.

use std::collections::HashSet;

use crate::candidate::PriceCandidate;

/// Identity of one listing across sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    /// URL without its query string, lowercased.
    Url(String),
    /// Price rounded to the nearest 100 plus source name, for candidates
    /// whose URL does not identify the listing (missing, or a search page).
    PriceSource { bucket: i64, source: String },
}

/// The URL part of a dedup key: everything before `?`, trimmed and lowercased.
pub fn normalize_url(url: &str) -> String {
    url.split('?').next().unwrap_or("").trim().to_lowercase()
}

pub fn dedup_key(candidate: &PriceCandidate) -> DedupKey {
    let url = normalize_url(&candidate.source_url);
    if url.is_empty() || !candidate.direct_link {
        DedupKey::PriceSource {
            bucket: (candidate.extracted_price / 100.0).round() as i64,
            source: candidate.source_name.to_lowercase(),
        }
    } else {
        DedupKey::Url(url)
    }
}

/// Keeps the first candidate seen for every [`DedupKey`], in input order.
/// Later duplicates are dropped, never merged.
pub fn dedup(candidates: Vec<PriceCandidate>) -> Vec<PriceCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(dedup_key(c)))
        .collect()
}
