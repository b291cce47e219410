//! IQR-based outlier rejection for one query's price set.
//!
//! Quartiles are positional (`sorted[n / 4]`, `sorted[3n / 4]`), not
//! interpolated. Small samples shift the bounds noticeably; keep it that way,
//! callers and tests depend on those exact boundaries.

use crate::candidate::Priced;

/// Below this many records no filtering is attempted.
pub const MIN_SAMPLE: usize = 3;
/// Multiplier applied to the IQR on either side of the quartiles.
pub const IQR_FENCE: f64 = 1.5;
/// The lower bound never rises above this share of the cheapest price.
pub const CHEAPEST_FLOOR_RATIO: f64 = 0.3;
/// Anything below this share of the median is dropped.
pub const MEDIAN_FLOOR_RATIO: f64 = 0.1;
/// If fewer than this share of records survive, fall back to the middle half.
pub const MIN_KEPT_RATIO: f64 = 0.3;

/// Bounds computed for one record set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
    pub median_floor: f64,
}

impl OutlierBounds {
    /// Computes bounds from prices already sorted ascending. Returns `None`
    /// for fewer than [`MIN_SAMPLE`] prices.
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let n = sorted.len();
        if n < MIN_SAMPLE {
            return None;
        }
        let q1 = sorted[n / 4];
        let q3 = sorted[(3 * n) / 4];
        let iqr = q3 - q1;
        let lower = (q1 - IQR_FENCE * iqr).max(CHEAPEST_FLOOR_RATIO * sorted[0]);
        let upper = q3 + IQR_FENCE * iqr;
        let median_floor = MEDIAN_FLOOR_RATIO * sorted[n / 2];
        Some(Self {
            q1,
            q3,
            lower,
            upper,
            median_floor,
        })
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower.max(self.median_floor) && price <= self.upper
    }
}

/// Returns the records considered statistically reliable, in input order.
///
/// Fewer than three records come back unchanged. When the IQR bounds would
/// drop more than 70% of the set, the middle 50% by price position is kept
/// instead.
pub fn filter_outliers<T: Priced + Clone>(records: &[T]) -> Vec<T> {
    let n = records.len();
    if n < MIN_SAMPLE {
        return records.to_vec();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| records[a].price().total_cmp(&records[b].price()));
    let sorted: Vec<f64> = order.iter().map(|&i| records[i].price()).collect();

    let Some(bounds) = OutlierBounds::from_sorted(&sorted) else {
        return records.to_vec();
    };

    let kept: Vec<T> = records
        .iter()
        .filter(|r| bounds.contains(r.price()))
        .cloned()
        .collect();

    if (kept.len() as f64) >= MIN_KEPT_RATIO * n as f64 {
        return kept;
    }

    tracing::debug!(
        total = n,
        kept = kept.len(),
        "outlier bounds too aggressive, keeping middle half"
    );
    let mut middle = vec![false; n];
    for &i in &order[n / 4..(3 * n) / 4] {
        middle[i] = true;
    }
    records
        .iter()
        .zip(middle)
        .filter_map(|(r, keep)| keep.then(|| r.clone()))
        .collect()
}
