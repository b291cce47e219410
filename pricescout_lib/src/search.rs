//! Fan-out / fan-in over source fetchers.
//!
//! Every (variation, source) pair is fetched on its own task, bounded by a
//! semaphore and a per-fetch timeout. Nothing is shared between tasks; their
//! results are merged in dispatch order once all of them have resolved, and
//! only then parsed and refined on the calling task.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use pricescout_api::types::RawListing;

use crate::aggregate::PriceAggregate;
use crate::candidate::{CandidateSource, PriceCandidate};
use crate::decompose::QueryDecomposition;
use crate::locale::Conversion;
use crate::pipeline::{refine, RefineStats};
use crate::sources::{SourceError, SourceFetcher};

/// Result of one (variation, source) fetch.
#[derive(Debug)]
pub struct FetchOutcome {
    pub source: String,
    pub variation: String,
    pub result: Result<Vec<RawListing>, SourceError>,
}

/// Candidates gathered from one fan-out, in dispatch order.
#[derive(Debug, Default)]
pub struct Collected {
    pub candidates: Vec<PriceCandidate>,
    /// Sources that answered at least once.
    pub sources_ok: Vec<String>,
    /// Sources that never answered.
    pub sources_failed: Vec<String>,
}

/// Everything one search produced.
#[derive(Debug)]
pub struct SearchRun {
    pub validated: Vec<PriceCandidate>,
    pub aggregate: PriceAggregate,
    pub stats: RefineStats,
    pub sources_ok: Vec<String>,
    pub sources_failed: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PriceSearch {
    concurrency: usize,
    fetch_timeout: Duration,
}

impl PriceSearch {
    pub fn new(concurrency: usize, fetch_timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            fetch_timeout,
        }
    }

    /// Dispatches every variation to every fetcher and waits for all of them.
    ///
    /// A failed or timed-out fetch yields an `Err` outcome; it never aborts
    /// its siblings.
    pub async fn fan_out<F>(
        &self,
        fetchers: &[Arc<F>],
        variations: &[String],
        country: &str,
    ) -> Vec<FetchOutcome>
    where
        F: SourceFetcher + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();
        let mut dispatched: Vec<(String, String)> = Vec::new();

        for variation in variations {
            for fetcher in fetchers {
                let index = dispatched.len();
                dispatched.push((fetcher.name().to_string(), variation.clone()));

                let fetcher = Arc::clone(fetcher);
                let semaphore = Arc::clone(&semaphore);
                let search = variation.clone();
                let country = country.to_string();
                let timeout = self.fetch_timeout;
                set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let result =
                        match tokio::time::timeout(timeout, fetcher.fetch(&search, &country)).await {
                            Ok(result) => result,
                            Err(_) => Err(SourceError::Timeout {
                                source_name: fetcher.name().to_string(),
                                secs: timeout.as_secs(),
                            }),
                        };
                    (index, result)
                });
            }
        }

        let mut slots: Vec<Option<Result<Vec<RawListing>, SourceError>>> =
            (0..dispatched.len()).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("fetch task failed: {}", e),
            }
        }

        dispatched
            .into_iter()
            .zip(slots)
            .map(|((source, variation), slot)| FetchOutcome {
                result: slot.unwrap_or_else(|| {
                    Err(SourceError::Timeout {
                        source_name: source.clone(),
                        secs: 0,
                    })
                }),
                source,
                variation,
            })
            .collect()
    }

    /// Parses fetched listings into candidates. Failed fetches contribute
    /// nothing and are logged.
    pub fn collect(outcomes: Vec<FetchOutcome>, conversion: &Conversion) -> Collected {
        let now = Utc::now();
        let mut collected = Collected::default();
        let mut failed: Vec<String> = Vec::new();

        for outcome in outcomes {
            match outcome.result {
                Ok(listings) => {
                    if !collected.sources_ok.contains(&outcome.source) {
                        collected.sources_ok.push(outcome.source.clone());
                    }
                    let origin = CandidateSource {
                        source_name: &outcome.source,
                        search_engine: &outcome.variation,
                        conversion,
                    };
                    let before = collected.candidates.len();
                    collected.candidates.extend(
                        listings
                            .iter()
                            .filter_map(|l| PriceCandidate::from_listing(l, &origin, now)),
                    );
                    tracing::debug!(
                        source = %outcome.source,
                        variation = %outcome.variation,
                        listings = listings.len(),
                        priced = collected.candidates.len() - before,
                        "source answered"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "{} failed for '{}': {}",
                        outcome.source,
                        outcome.variation,
                        e
                    );
                    if !failed.contains(&outcome.source) {
                        failed.push(outcome.source);
                    }
                }
            }
        }

        collected.sources_failed = failed
            .into_iter()
            .filter(|s| !collected.sources_ok.contains(s))
            .collect();
        collected
    }

    /// Fans out, collects, and refines one decomposed query.
    pub async fn run<F>(
        &self,
        fetchers: &[Arc<F>],
        decomposition: &QueryDecomposition,
        country: &str,
        conversion: &Conversion,
    ) -> SearchRun
    where
        F: SourceFetcher + 'static,
    {
        let outcomes = self
            .fan_out(fetchers, &decomposition.variations, country)
            .await;
        let collected = Self::collect(outcomes, conversion);
        let refined = refine(collected.candidates, decomposition);
        SearchRun {
            validated: refined.validated,
            aggregate: refined.aggregate,
            stats: refined.stats,
            sources_ok: collected.sources_ok,
            sources_failed: collected.sources_failed,
        }
    }
}
