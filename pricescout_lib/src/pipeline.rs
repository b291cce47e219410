//! The synchronous part of a search: dedup, relevance, price constraints,
//! outlier rejection and aggregation, in that order.

use crate::aggregate::{aggregate, PriceAggregate};
use crate::candidate::PriceCandidate;
use crate::decompose::QueryDecomposition;
use crate::dedup::dedup;
use crate::outlier::filter_outliers;
use crate::relevance::filter_relevant;

/// How many candidates each stage removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefineStats {
    pub input: usize,
    pub duplicates: usize,
    pub irrelevant: usize,
    pub out_of_range: usize,
    pub outliers: usize,
}

#[derive(Debug, Clone)]
pub struct Refined {
    /// Survivors in first-seen order.
    pub validated: Vec<PriceCandidate>,
    pub aggregate: PriceAggregate,
    pub stats: RefineStats,
}

/// Keeps candidates inside the query's `min_price..=max_price`, when given.
pub fn within_constraints(
    candidates: Vec<PriceCandidate>,
    decomposition: &QueryDecomposition,
) -> Vec<PriceCandidate> {
    candidates
        .into_iter()
        .filter(|c| decomposition.min_price.map_or(true, |min| c.extracted_price >= min))
        .filter(|c| decomposition.max_price.map_or(true, |max| c.extracted_price <= max))
        .collect()
}

pub fn refine(candidates: Vec<PriceCandidate>, decomposition: &QueryDecomposition) -> Refined {
    let mut stats = RefineStats {
        input: candidates.len(),
        ..RefineStats::default()
    };

    let unique = dedup(candidates);
    stats.duplicates = stats.input - unique.len();

    let relevant = filter_relevant(unique, decomposition);
    stats.irrelevant = stats.input - stats.duplicates - relevant.len();

    let in_range = within_constraints(relevant, decomposition);
    stats.out_of_range = stats.input - stats.duplicates - stats.irrelevant - in_range.len();

    let validated = filter_outliers(&in_range);
    stats.outliers = in_range.len() - validated.len();

    tracing::debug!(
        input = stats.input,
        duplicates = stats.duplicates,
        irrelevant = stats.irrelevant,
        out_of_range = stats.out_of_range,
        outliers = stats.outliers,
        "refined candidates"
    );

    let aggregate = aggregate(&validated);
    Refined {
        validated,
        aggregate,
        stats,
    }
}
