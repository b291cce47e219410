//! Market summary over the validated price set: spread, variation and a
//! best-value pick.

use serde::{Deserialize, Serialize};

use crate::ai::ProductInsight;
use crate::candidate::PriceCandidate;
use crate::locale::Conversion;

/// A best-value pick must sit within this fraction of the average price.
const BEST_VALUE_BAND: f64 = 0.3;

/// The listing recommended as best value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestValue {
    pub name: String,
    pub price: f64,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub product_name: String,
    pub lowest: f64,
    pub highest: f64,
    pub average: f64,
    /// `highest - lowest`.
    pub spread: f64,
    /// Spread as a percentage of the average, one decimal.
    pub variation_pct: f64,
    pub count: usize,
    /// Typical price range reported by the product insight, in the search currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typical_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_value: Option<BestValue>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Picks the listing nearest the average among those within
/// [`BEST_VALUE_BAND`] of it, preferring product pages over search pages.
/// Ties keep the first-seen listing.
fn best_value(candidates: &[PriceCandidate], average: f64) -> Option<&PriceCandidate> {
    let band = average * BEST_VALUE_BAND;
    let mut best: Option<&PriceCandidate> = None;
    for c in candidates {
        let distance = (c.extracted_price - average).abs();
        if distance >= band {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => {
                let b_distance = (b.extracted_price - average).abs();
                (c.direct_link && !b.direct_link) || (c.direct_link == b.direct_link && distance < b_distance)
            }
        };
        if better {
            best = Some(c);
        }
    }
    best
}

/// Summarizes `candidates`, or returns `None` when there is nothing to summarize.
pub fn analyze(candidates: &[PriceCandidate], insight: &ProductInsight, conversion: &Conversion) -> Option<MarketAnalysis> {
    if candidates.is_empty() {
        return None;
    }
    let prices = candidates.iter().map(|c| c.extracted_price);
    let lowest = prices.clone().fold(f64::INFINITY, f64::min);
    let highest = prices.clone().fold(f64::NEG_INFINITY, f64::max);
    let average = prices.sum::<f64>() / candidates.len() as f64;
    let variation_pct = if average > 0.0 {
        round_to((highest - lowest) / average * 100.0, 1)
    } else {
        0.0
    };

    let (typical_min, typical_max) = match (insight.price_range_min, insight.price_range_max) {
        (Some(min), Some(max)) if min > 0.0 && max >= min => {
            (Some(conversion.from_base(min)), Some(conversion.from_base(max)))
        }
        _ => (None, None),
    };

    let best_value = best_value(candidates, average).map(|c| BestValue {
        name: c.name.clone(),
        price: c.extracted_price,
        source: c.source_name.clone(),
        url: c.source_url.clone(),
    });

    Some(MarketAnalysis {
        product_name: insight.product_name.clone(),
        lowest,
        highest,
        average: round_to(average, 2),
        spread: round_to(highest - lowest, 2),
        variation_pct,
        count: candidates.len(),
        typical_min,
        typical_max,
        best_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::detect_product_by_rules;
    use crate::candidate::candidate;
    use crate::locale::Currency;

    fn rupees() -> Conversion {
        Conversion::to(Currency {
            symbol: "₹".to_string(),
            code: "INR".to_string(),
            rate: 1.0,
        })
    }

    fn search_page(price: f64, source: &str) -> PriceCandidate {
        PriceCandidate {
            direct_link: false,
            ..candidate(price, source, "https://shop.example/s?k=chair")
        }
    }

    #[test]
    fn empty_set_has_no_analysis() {
        assert!(analyze(&[], &detect_product_by_rules("chair"), &rupees()).is_none());
    }

    #[test]
    fn summary_figures() {
        let set = vec![
            candidate(100.0, "a", "https://a.example/p/1"),
            candidate(200.0, "b", "https://b.example/p/2"),
            candidate(300.0, "c", "https://c.example/p/3"),
        ];
        let analysis = analyze(&set, &detect_product_by_rules("office chair"), &rupees()).unwrap();
        assert_eq!(analysis.product_name, "Office Chair");
        assert_eq!(analysis.lowest, 100.0);
        assert_eq!(analysis.highest, 300.0);
        assert_eq!(analysis.average, 200.0);
        assert_eq!(analysis.spread, 200.0);
        assert_eq!(analysis.variation_pct, 100.0);
        assert_eq!(analysis.count, 3);
        assert!(analysis.typical_min.is_none());
        assert_eq!(analysis.best_value.unwrap().price, 200.0);
    }

    #[test]
    fn best_value_prefers_product_pages() {
        let set = vec![
            search_page(200.0, "a"),
            candidate(170.0, "b", "https://b.example/p/1"),
            candidate(230.0, "c", "https://c.example/p/2"),
        ];
        let analysis = analyze(&set, &detect_product_by_rules("chair"), &rupees()).unwrap();
        let best = analysis.best_value.unwrap();
        assert_eq!(best.price, 170.0);
        assert_eq!(best.source, "b");
    }

    #[test]
    fn no_best_value_outside_band() {
        let set = vec![
            candidate(100.0, "a", "https://a.example/p/1"),
            candidate(1000.0, "b", "https://b.example/p/2"),
        ];
        let analysis = analyze(&set, &detect_product_by_rules("chair"), &rupees()).unwrap();
        assert_eq!(analysis.average, 550.0);
        assert_eq!(analysis.variation_pct, 163.6);
        assert!(analysis.best_value.is_none());
    }

    #[test]
    fn typical_range_in_search_currency() {
        let dollars = Conversion::to(Currency {
            symbol: "$".to_string(),
            code: "USD".to_string(),
            rate: 0.012,
        });
        let set = vec![candidate(899.99, "a", "https://a.example/p/1")];
        let analysis = analyze(&set, &detect_product_by_rules("gaming laptop"), &dollars).unwrap();
        assert_eq!(analysis.typical_min, Some(300.0));
        assert_eq!(analysis.typical_max, Some(1800.0));
        assert_eq!(analysis.variation_pct, 0.0);
    }
}
