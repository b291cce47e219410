//! The `search` subcommand: one query across every source.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pricescout_lib::{Db, SearchOutcome, SearchRecord, SearchService};

use crate::output::{print_analysis, print_json, print_results, print_stores, OutputFormat};

#[derive(Args)]
pub struct SearchArgs {
    /// What to price, e.g. "samsung galaxy s24 under 80000 in mumbai"
    pub query: String,

    /// Listings to show (1-200); the summary always covers every listing
    #[arg(long, default_value = "20")]
    pub max_results: usize,

    /// Record this search in a SQLite history database
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub async fn run(args: &SearchArgs, service: &SearchService, format: &OutputFormat) -> Result<()> {
    let outcome = service.search(&args.query, args.max_results).await?;

    if let Some(ref path) = args.db {
        record(path, &outcome, service.ai().model_name());
    }

    if *format == OutputFormat::Json {
        print_json(&outcome);
        return Ok(());
    }

    eprintln!(
        "{} in {}, {} ({})",
        outcome.decomposition.primary_query,
        outcome.location.city,
        outcome.location.country,
        outcome.currency.code
    );
    if let Some(ref message) = outcome.message {
        eprintln!("{}", message);
    }
    if !outcome.sources_failed.is_empty() {
        eprintln!("No response from: {}", outcome.sources_failed.join(", "));
    }
    if outcome.has_prices() {
        eprintln!(
            "Showing {} of {} listings from {} sources",
            outcome.results.len(),
            outcome.results_count,
            outcome.aggregate.all_sources.len()
        );
        print_results(&outcome.results, &outcome.aggregate, &outcome.currency.symbol, format)?;
        if let Some(ref analysis) = outcome.analysis {
            print_analysis(analysis, &outcome.currency.symbol, format);
        }
    }
    if let Some(ref city) = outcome.local_stores_city {
        eprintln!("{} stores found in {}", outcome.local_stores.len(), city);
        if !outcome.local_stores.is_empty() {
            print_stores(&outcome.local_stores, format)?;
        }
    }
    Ok(())
}

/// History is best effort: a failure here never fails the search.
fn record(path: &PathBuf, outcome: &SearchOutcome, ai_model: &str) {
    let result = Db::open(path).and_then(|db| {
        db.init()?;
        db.record_search(&SearchRecord::from_outcome(outcome, ai_model))
    });
    if let Err(e) = result {
        tracing::warn!("could not record search in {}: {}", path.display(), e);
    }
}
