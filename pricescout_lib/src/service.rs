//! The search entry points: one query, or a batch of bulk rows.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use pricescout_api::Client;

use crate::aggregate::PriceAggregate;
use crate::ai::AiBackend;
use crate::analysis::{analyze, MarketAnalysis};
use crate::bulk::{BulkReport, BulkRow, RowComparison};
use crate::candidate::PriceCandidate;
use crate::config::SearchConfig;
use crate::decompose::{decompose, simplify_product_query, QueryDecomposition};
use crate::error::PriceScoutError;
use crate::filters::{AvailableFilters, FilterCatalog};
use crate::local_stores::{LocalStore, LocalStoreFinder};
use crate::locale::{Currency, LocaleTable, Location};
use crate::marketplace::MarketplaceDirectory;
use crate::scrape::PageScraper;
use crate::search::PriceSearch;
use crate::sources::{LiveSource, Source, SourceKind};
use crate::validation::{validate_bulk_row, validate_max_results, validate_query, MAX_RESULTS_LIMIT};

pub const NO_DATA_MESSAGE: &str = "No live prices available";
pub const UNAVAILABLE_MESSAGE: &str = "Search Unavailable";

/// A source that took part in a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub description: String,
}

impl DataSource {
    fn from_source(source: &Source) -> Self {
        let (fallback_type, description) = match &source.kind {
            SourceKind::JsonFeed { .. } => ("Listing Feed", format!("Structured listings from {}", source.name)),
            SourceKind::HtmlPage { .. } => ("Web Page", format!("Search results scraped from {}", source.name)),
        };
        Self {
            name: source.name.clone(),
            url: source.display_url().to_string(),
            source_type: source
                .source_type
                .map(|t| t.label())
                .unwrap_or(fallback_type)
                .to_string(),
            description,
        }
    }
}

/// Everything returned for one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub success: bool,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub location: Location,
    pub currency: Currency,
    pub decomposition: QueryDecomposition,
    pub results: Vec<PriceCandidate>,
    /// Size of the whole validated set, before truncation to `max_results`.
    pub results_count: usize,
    pub aggregate: PriceAggregate,
    pub data_sources: Vec<DataSource>,
    pub sources_failed: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<MarketAnalysis>,
    pub available_filters: AvailableFilters,
    pub local_stores: Vec<LocalStore>,
    /// City the local stores were looked up in, when a lookup ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_stores_city: Option<String>,
}

impl SearchOutcome {
    fn unavailable(query: String, location: Location, currency: Currency, decomposition: QueryDecomposition) -> Self {
        Self {
            success: false,
            query,
            message: Some(UNAVAILABLE_MESSAGE.to_string()),
            location,
            currency,
            decomposition,
            results: Vec::new(),
            results_count: 0,
            aggregate: PriceAggregate::default(),
            data_sources: Vec::new(),
            sources_failed: Vec::new(),
            analysis: None,
            available_filters: AvailableFilters::default(),
            local_stores: Vec::new(),
            local_stores_city: None,
        }
    }

    pub fn has_prices(&self) -> bool {
        !self.aggregate.is_empty()
    }
}

struct Inner {
    locales: LocaleTable,
    directory: MarketplaceDirectory,
    filters: FilterCatalog,
    stores: Option<LocalStoreFinder>,
    ai: AiBackend,
    config: SearchConfig,
    engine: PriceSearch,
    feed: Arc<Client>,
    scraper: Arc<PageScraper>,
}

/// Owns the lookup tables, the marketplace cache and the HTTP clients.
/// Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct SearchService {
    inner: Arc<Inner>,
}

impl SearchService {
    pub fn new(config: SearchConfig, ai: AiBackend) -> Result<Self, PriceScoutError> {
        let locales = LocaleTable::load()?;
        let directory = MarketplaceDirectory::load(config.cache_ttl(), config.cache_capacity)?;
        let filters = FilterCatalog::load()?;
        let scraper = PageScraper::with_timeout(config.fetch_timeout())?;
        let stores = match &config.map_endpoint {
            Some(endpoint) => Some(LocalStoreFinder::new(endpoint, config.fetch_timeout())?),
            None => None,
        };
        let feed = Client::with_timeout(config.fetch_timeout());
        let engine = PriceSearch::new(config.concurrency, config.fetch_timeout());
        Ok(Self {
            inner: Arc::new(Inner {
                locales,
                directory,
                filters,
                stores,
                ai,
                config,
                engine,
                feed: Arc::new(feed),
                scraper: Arc::new(scraper),
            }),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.inner.config
    }

    pub fn ai(&self) -> &AiBackend {
        &self.inner.ai
    }

    /// Configured sources first, then directory marketplaces not already
    /// named by the configuration.
    fn sources_for(&self, product: &str, category: &str, country: &str) -> Vec<Source> {
        let mut sources = self.inner.config.sources.clone();
        if self.inner.config.use_directory {
            for marketplace in self.inner.directory.resolve(product, category, country).iter() {
                if !sources.iter().any(|s| s.name.eq_ignore_ascii_case(&marketplace.name)) {
                    sources.push(Source::from(marketplace));
                }
            }
        }
        sources
    }

    /// Searches every source for `query`.
    ///
    /// Only invalid input is an error. Finding nothing yields a successful
    /// outcome with an explanatory message.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<SearchOutcome, PriceScoutError> {
        let query = validate_query(query)?;
        let max_results = validate_max_results(max_results)?;
        let location = self.inner.locales.detect_location(&query);
        Ok(self.search_at(query, location, max_results).await)
    }

    /// Searches for a validated `query` in `location`, reporting prices in
    /// the location's currency.
    async fn search_at(&self, query: String, location: Location, max_results: usize) -> SearchOutcome {
        let inner = &self.inner;
        let currency = inner.locales.currency(&location.country);
        let product_query = inner.locales.strip_location(&query, &location);
        let decomposition = decompose(&product_query);

        let insight = inner.ai.detect_product(&product_query).await;
        if !insight.is_searchable {
            tracing::info!("'{}' is not a searchable product", product_query);
            return SearchOutcome::unavailable(query, location, currency, decomposition);
        }

        let sources = self.sources_for(&decomposition.primary_query, &insight.category, &location.country);
        tracing::info!(
            query = %decomposition.primary_query,
            country = %location.country,
            sources = sources.len(),
            variations = decomposition.variations.len(),
            "searching"
        );
        let data_sources: Vec<DataSource> = sources.iter().map(DataSource::from_source).collect();
        let retry = inner.config.retry_policy();
        let fetchers: Vec<Arc<LiveSource>> = sources
            .into_iter()
            .map(|s| {
                Arc::new(
                    LiveSource::new(s, Arc::clone(&inner.feed), Arc::clone(&inner.scraper), retry)
                        .with_currency(&currency.code),
                )
            })
            .collect();

        let conversion = inner.locales.conversion(&location.country);
        let store_finder = inner.stores.as_ref().filter(|_| location.has_city());
        let local_stores = async {
            match store_finder {
                Some(finder) => finder.search(&decomposition.primary_query, &location).await,
                None => Vec::new(),
            }
        };
        let (run, local_stores) = tokio::join!(
            inner
                .engine
                .run(&fetchers, &decomposition, &location.country, &conversion),
            local_stores
        );

        let results_count = run.validated.len();
        let message = if results_count == 0 {
            tracing::info!("no live prices for '{}'", decomposition.primary_query);
            Some(NO_DATA_MESSAGE.to_string())
        } else {
            None
        };
        let analysis = analyze(&run.validated, &insight, &conversion);
        let available_filters = inner
            .filters
            .available_filters(&decomposition.primary_query, &insight, &run.validated);
        let local_stores_city = store_finder.map(|_| location.city.clone());
        let mut results = run.validated;
        results.truncate(max_results);

        SearchOutcome {
            success: true,
            query,
            message,
            location,
            currency,
            decomposition,
            results,
            results_count,
            aggregate: run.aggregate,
            data_sources,
            sources_failed: run.sources_failed,
            analysis,
            available_filters,
            local_stores,
            local_stores_city,
        }
    }

    /// Compares one row against the market of the configured bulk country.
    /// A row whose simplified query is unusable has no market data.
    async fn compare_row(&self, row: BulkRow) -> RowComparison {
        let search_query = simplify_product_query(&row.item);
        let aggregate = match validate_query(&search_query) {
            Ok(query) => {
                let location = Location::country(&self.inner.config.bulk_country);
                self.search_at(query, location, MAX_RESULTS_LIMIT).await.aggregate
            }
            Err(e) => {
                tracing::warn!("bulk row '{}' not searched: {}", row.item, e);
                PriceAggregate::default()
            }
        };
        RowComparison::new(&row, &search_query, aggregate)
    }

    /// Compares every row, `bulk_batch_size` rows at a time, calling
    /// `on_row` as each row completes. Rows come back in input order.
    pub async fn bulk_compare_with<P>(&self, rows: Vec<BulkRow>, mut on_row: P) -> Result<BulkReport, PriceScoutError>
    where
        P: FnMut(&RowComparison),
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                let item = validate_bulk_row(&row.item, row.user_rate, row.qty)?;
                Ok(BulkRow { item, ..row })
            })
            .collect::<Result<Vec<_>, PriceScoutError>>()?;

        let mut compared: Vec<Option<RowComparison>> = (0..rows.len()).map(|_| None).collect();
        let batch_size = self.inner.config.bulk_batch_size.max(1);
        for (batch_no, batch) in rows.chunks(batch_size).enumerate() {
            let mut set = JoinSet::new();
            for (offset, row) in batch.iter().enumerate() {
                let index = batch_no * batch_size + offset;
                let service = self.clone();
                let row = row.clone();
                set.spawn(async move { (index, service.compare_row(row).await) });
            }
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((index, comparison)) => {
                        on_row(&comparison);
                        compared[index] = Some(comparison);
                    }
                    Err(e) => tracing::error!("bulk row task failed: {}", e),
                }
            }
        }

        let compared = rows
            .iter()
            .zip(compared)
            .map(|(row, slot)| {
                slot.unwrap_or_else(|| {
                    RowComparison::new(row, &simplify_product_query(&row.item), PriceAggregate::default())
                })
            })
            .collect();
        Ok(BulkReport::new(compared, &self.inner.config.gst))
    }

    pub async fn bulk_compare(&self, rows: Vec<BulkRow>) -> Result<BulkReport, PriceScoutError> {
        self.bulk_compare_with(rows, |_| {}).await
    }
}
