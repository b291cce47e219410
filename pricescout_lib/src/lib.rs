//! Library layer for PriceScout: price extraction, cross-source
//! reconciliation and the search orchestration around it.
//!
//! Raw listings come from `pricescout_api` feeds and scraped search pages.
//! They are parsed into [`PriceCandidate`]s, deduplicated, filtered for
//! relevance and outliers, and summarized as a [`PriceAggregate`] and a
//! [`MarketAnalysis`]. Searches in a named city also list nearby stores.

pub mod aggregate;
pub mod ai;
pub mod analysis;
pub mod bulk;
pub mod cache;
pub mod candidate;
pub mod config;
pub mod db;
pub mod decompose;
pub mod dedup;
pub mod error;
pub mod filters;
pub mod local_stores;
pub mod locale;
pub mod marketplace;
pub mod outlier;
pub mod pipeline;
pub mod price_parser;
pub mod relevance;
pub mod scrape;
pub mod search;
pub mod service;
pub mod sources;
pub mod url_clean;
pub mod validation;

pub use pricescout_api;
pub use pricescout_api::types;

pub use aggregate::{aggregate, PriceAggregate, PricePoint};
pub use ai::{AiBackend, AiConfig, ProductInsight};
pub use analysis::{BestValue, MarketAnalysis};
pub use bulk::{BulkReport, BulkRow, BulkTotals, GstSummary, RowComparison, Verdict};
pub use candidate::PriceCandidate;
pub use config::{GstRates, SearchConfig};
pub use db::{Db, DbError, SearchRecord};
pub use decompose::{decompose, simplify_product_query, QueryDecomposition};
pub use error::PriceScoutError;
pub use filters::{AvailableFilters, FilterCatalog};
pub use local_stores::{LocalStore, LocalStoreFinder};
pub use locale::{Currency, LocaleTable, Location};
pub use price_parser::{extract_price, parse_price};
pub use scrape::{PageScraper, ScrapeError};
pub use search::{PriceSearch, SearchRun};
pub use service::{DataSource, SearchOutcome, SearchService};
pub use sources::{LiveSource, RetryPolicy, Source, SourceError, SourceFetcher, SourceKind};
