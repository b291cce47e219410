//! The canonical price record produced from one scraped fragment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locale::Conversion;
use crate::price_parser::{detect_currency_symbol, extract_price_scaled, parse_bare_amount};

/// One parsed price observation from one source fragment.
///
/// Built once by [`PriceCandidate::from_listing`] and never mutated
/// afterwards; the pipeline only filters and reorders candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCandidate {
    pub name: String,
    pub raw_text: String,
    pub extracted_price: f64,
    pub currency_symbol: String,
    pub source_name: String,
    pub source_url: String,
    /// The search phrasing (variation) that surfaced this listing.
    pub search_engine: String,
    /// Whether `source_url` points at a product page rather than a search page.
    pub direct_link: bool,
    pub timestamp: DateTime<Utc>,
}

/// Anything that carries a price. Lets the outlier filter and the aggregate
/// calculator work on candidates and on plain test records alike.
pub trait Priced {
    fn price(&self) -> f64;
}

impl Priced for PriceCandidate {
    fn price(&self) -> f64 {
        self.extracted_price
    }
}

impl Priced for f64 {
    fn price(&self) -> f64 {
        *self
    }
}

/// Fields needed to build a candidate, gathered by the fan-out before parsing.
#[derive(Debug, Clone)]
pub struct CandidateSource<'a> {
    pub source_name: &'a str,
    pub search_engine: &'a str,
    /// Currency the search reports in.
    pub conversion: &'a Conversion,
}

impl PriceCandidate {
    /// Parses `listing.price_text` and builds a candidate priced in the
    /// search currency, or returns `None` when the text holds no plausible
    /// price. The amount is read in the currency written in the text (the
    /// search currency when none is written) and checked against the
    /// plausibility band in INR terms. A bare number is accepted when no
    /// currency-marked price is present.
    pub fn from_listing(
        listing: &pricescout_api::types::RawListing,
        origin: &CandidateSource<'_>,
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        let target = origin.conversion.target();
        let written = detect_currency_symbol(&listing.price_text).unwrap_or(target.symbol.as_str());
        let scale = origin.conversion.base_factor(written);
        let base = extract_price_scaled(&listing.price_text, scale)
            .or_else(|| parse_bare_amount(&listing.price_text, scale))?;
        let price = origin.conversion.from_base(base);
        let source_url = crate::url_clean::clean_product_url(listing.source_url.trim());
        let direct_link = crate::url_clean::is_valid_product_url(&source_url);
        let currency_symbol = target.symbol.clone();
        Some(Self {
            name: listing.name.trim().to_string(),
            raw_text: listing.price_text.clone(),
            extracted_price: price,
            currency_symbol,
            source_name: listing
                .source_name
                .clone()
                .unwrap_or_else(|| origin.source_name.to_string()),
            source_url,
            search_engine: origin.search_engine.to_string(),
            direct_link,
            timestamp,
        })
    }
}

#[cfg(test)]
pub(crate) fn candidate(price: f64, source: &str, url: &str) -> PriceCandidate {
    PriceCandidate {
        name: format!("{} listing", source),
        raw_text: format!("₹{}", price),
        extracted_price: price,
        currency_symbol: "₹".to_string(),
        source_name: source.to_string(),
        source_url: url.to_string(),
        search_engine: "test".to_string(),
        direct_link: true,
        timestamp: DateTime::from_timestamp(1_767_225_600, 0).unwrap_or_default(),
    }
}
