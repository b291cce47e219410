//! Min / median / max summary of a validated price set.

use serde::{Deserialize, Serialize};

use crate::candidate::PriceCandidate;

/// One summary price plus the listing it is attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: f64,
    pub source: String,
    pub url: String,
}

impl PricePoint {
    fn from_candidate(c: &PriceCandidate) -> Self {
        Self {
            price: c.extracted_price,
            source: c.source_name.clone(),
            url: c.source_url.clone(),
        }
    }
}

/// Summary statistics for one query. `None` fields mean "not available".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceAggregate {
    pub min: Option<PricePoint>,
    pub median: Option<PricePoint>,
    pub max: Option<PricePoint>,
    /// Distinct source names, in first-seen order.
    pub all_sources: Vec<String>,
    pub count: usize,
}

impl PriceAggregate {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn min_price(&self) -> Option<f64> {
        self.min.as_ref().map(|p| p.price)
    }

    pub fn median_price(&self) -> Option<f64> {
        self.median.as_ref().map(|p| p.price)
    }

    pub fn max_price(&self) -> Option<f64> {
        self.max.as_ref().map(|p| p.price)
    }
}

/// Computes the aggregate for `candidates`.
///
/// For an even count the median price is the mean of the two middle prices,
/// attributed to the upper of the two so it always names a real listing.
pub fn aggregate(candidates: &[PriceCandidate]) -> PriceAggregate {
    let mut all_sources: Vec<String> = Vec::new();
    for c in candidates {
        if !all_sources.contains(&c.source_name) {
            all_sources.push(c.source_name.clone());
        }
    }

    let n = candidates.len();
    if n == 0 {
        return PriceAggregate {
            all_sources,
            ..PriceAggregate::default()
        };
    }

    let mut sorted: Vec<&PriceCandidate> = candidates.iter().collect();
    sorted.sort_by(|a, b| a.extracted_price.total_cmp(&b.extracted_price));

    let median = if n % 2 == 1 {
        PricePoint::from_candidate(sorted[n / 2])
    } else {
        let lower = sorted[n / 2 - 1];
        let upper = sorted[n / 2];
        PricePoint {
            price: (lower.extracted_price + upper.extracted_price) / 2.0,
            ..PricePoint::from_candidate(upper)
        }
    };

    PriceAggregate {
        min: Some(PricePoint::from_candidate(sorted[0])),
        median: Some(median),
        max: Some(PricePoint::from_candidate(sorted[n - 1])),
        all_sources,
        count: n,
    }
}
