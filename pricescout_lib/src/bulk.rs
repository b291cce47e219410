//! Bulk comparison of a user's quoted rates against market aggregates, with
//! GST computed on the totals.

use serde::{Deserialize, Serialize};

use crate::aggregate::PriceAggregate;
use crate::config::GstRates;

/// One uploaded row: an item, the rate the user was quoted and a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkRow {
    pub item: String,
    #[serde(alias = "rate")]
    pub user_rate: f64,
    #[serde(alias = "quantity")]
    pub qty: f64,
}

impl BulkRow {
    pub fn new(item: &str, user_rate: f64, qty: f64) -> Self {
        Self {
            item: item.to_string(),
            user_rate,
            qty,
        }
    }

    pub fn user_amount(&self) -> f64 {
        self.user_rate * self.qty
    }
}

/// User versus one market price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceDiff {
    pub market_rate: f64,
    pub rate_diff: f64,
    pub amount_diff: f64,
}

impl PriceDiff {
    fn between(row: &BulkRow, market_rate: f64) -> Self {
        Self {
            market_rate,
            rate_diff: row.user_rate - market_rate,
            amount_diff: row.user_amount() - market_rate * row.qty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowDiffs {
    pub min: Option<PriceDiff>,
    pub median: Option<PriceDiff>,
    pub max: Option<PriceDiff>,
}

/// Outcome of comparing one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowComparison {
    pub item: String,
    /// The simplified phrasing actually searched.
    pub search_query: String,
    pub user_rate: f64,
    pub qty: f64,
    pub user_amount: f64,
    pub aggregate: PriceAggregate,
    pub diffs: RowDiffs,
}

impl RowComparison {
    pub fn new(row: &BulkRow, search_query: &str, aggregate: PriceAggregate) -> Self {
        let diff = |rate: Option<f64>| rate.map(|r| PriceDiff::between(row, r));
        let diffs = RowDiffs {
            min: diff(aggregate.min_price()),
            median: diff(aggregate.median_price()),
            max: diff(aggregate.max_price()),
        };
        Self {
            item: row.item.clone(),
            search_query: search_query.to_string(),
            user_rate: row.user_rate,
            qty: row.qty,
            user_amount: row.user_amount(),
            aggregate,
            diffs,
        }
    }

    pub fn has_market_data(&self) -> bool {
        !self.aggregate.is_empty()
    }

    /// Source URLs behind the min, median and max prices, without repeats.
    pub fn source_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = Vec::new();
        for point in [&self.aggregate.min, &self.aggregate.median, &self.aggregate.max]
            .into_iter()
            .flatten()
        {
            if !point.url.is_empty() && !urls.contains(&point.url.as_str()) {
                urls.push(&point.url);
            }
        }
        urls
    }
}

/// Column sums across all rows.
///
/// `user_amount` covers every row; the market amounts only cover rows that
/// found market data, counted in `priced_rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkTotals {
    pub user_amount: f64,
    pub market_min: f64,
    pub market_median: f64,
    pub market_max: f64,
    pub priced_rows: usize,
    pub unpriced_rows: usize,
}

impl BulkTotals {
    pub fn from_rows(rows: &[RowComparison]) -> Self {
        rows.iter().fold(Self::default(), |mut totals, row| {
            totals.user_amount += row.user_amount;
            if row.has_market_data() {
                totals.priced_rows += 1;
                let amount = |rate: Option<f64>| rate.map(|r| r * row.qty).unwrap_or(0.0);
                totals.market_min += amount(row.aggregate.min_price());
                totals.market_median += amount(row.aggregate.median_price());
                totals.market_max += amount(row.aggregate.max_price());
            } else {
                totals.unpriced_rows += 1;
            }
            totals
        })
    }
}

/// Taxable amount through grand total for one pricing column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstSection {
    pub label: String,
    pub taxable: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub round_off: f64,
    pub grand_total: f64,
}

impl GstSection {
    pub fn compute(label: &str, taxable: f64, rates: &GstRates) -> Self {
        let cgst = taxable * rates.cgst;
        let sgst = taxable * rates.sgst;
        let total = taxable + cgst + sgst;
        let grand_total = total.round();
        Self {
            label: label.to_string(),
            taxable,
            cgst,
            sgst,
            round_off: grand_total - total,
            grand_total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Overpaying,
    GoodDeal,
    AtPar,
}

impl Verdict {
    pub fn from_difference(difference: f64) -> Self {
        if difference > 0.0 {
            Verdict::Overpaying
        } else if difference < 0.0 {
            Verdict::GoodDeal
        } else {
            Verdict::AtPar
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Overpaying => "overpaying",
            Verdict::GoodDeal => "good deal",
            Verdict::AtPar => "at par",
        }
    }
}

/// The user's grand total against one market grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstDifference {
    pub against: String,
    pub difference: f64,
    pub verdict: Verdict,
}

pub const YOUR_PRICING: &str = "YOUR PRICING";
pub const MARKET_MINIMUM: &str = "MARKET MINIMUM";
pub const MARKET_MEDIUM: &str = "MARKET MEDIUM";
pub const MARKET_MAXIMUM: &str = "MARKET MAXIMUM";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GstSummary {
    /// Your pricing first, then market minimum, medium and maximum.
    pub sections: Vec<GstSection>,
    pub differences: Vec<GstDifference>,
}

impl GstSummary {
    pub fn from_totals(totals: &BulkTotals, rates: &GstRates) -> Self {
        let yours = GstSection::compute(YOUR_PRICING, totals.user_amount, rates);
        let markets = [
            GstSection::compute(MARKET_MINIMUM, totals.market_min, rates),
            GstSection::compute(MARKET_MEDIUM, totals.market_median, rates),
            GstSection::compute(MARKET_MAXIMUM, totals.market_max, rates),
        ];
        let differences = markets
            .iter()
            .map(|m| {
                let difference = yours.grand_total - m.grand_total;
                GstDifference {
                    against: m.label.clone(),
                    difference,
                    verdict: Verdict::from_difference(difference),
                }
            })
            .collect();
        let mut sections = vec![yours];
        sections.extend(markets);
        Self {
            sections,
            differences,
        }
    }
}

/// Every row compared, plus totals and the GST summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    pub rows: Vec<RowComparison>,
    pub totals: BulkTotals,
    pub gst: GstSummary,
}

impl BulkReport {
    pub fn new(rows: Vec<RowComparison>, rates: &GstRates) -> Self {
        let totals = BulkTotals::from_rows(&rows);
        let gst = GstSummary::from_totals(&totals, rates);
        Self { rows, totals, gst }
    }
}
