//! Source strategies: how raw listings are fetched from one storefront.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use pricescout_api::types::RawListing;
use pricescout_api::{Client, ListingQuery, Query};

use crate::marketplace::{Marketplace, SourceType};
use crate::scrape::{PageScraper, ScrapeError};

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("feed error: {0}")]
    Api(#[from] pricescout_api::Error),
    #[error("scrape error: {0}")]
    Scrape(#[from] ScrapeError),
    #[error("{source_name} timed out after {secs}s")]
    Timeout { source_name: String, secs: u64 },
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.is_retryable(),
            Self::Scrape(e) => e.is_retryable(),
            Self::Timeout { .. } => false,
        }
    }
}

/// How a source is queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// A JSON listing feed speaking the `{"meta", "data"}` envelope.
    JsonFeed { endpoint: String },
    /// An HTML search page; the search text is appended to `search_url`.
    HtmlPage { search_url: String },
}

/// One storefront to query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(flatten)]
    pub kind: SourceKind,
    #[serde(default)]
    pub source_type: Option<SourceType>,
}

impl Source {
    pub fn json_feed(name: &str, endpoint: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SourceKind::JsonFeed {
                endpoint: endpoint.to_string(),
            },
            source_type: None,
        }
    }

    pub fn html_page(name: &str, search_url: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SourceKind::HtmlPage {
                search_url: search_url.to_string(),
            },
            source_type: None,
        }
    }

    /// Public URL shown for this source, without any query string.
    pub fn display_url(&self) -> &str {
        let url = match &self.kind {
            SourceKind::JsonFeed { endpoint } => endpoint,
            SourceKind::HtmlPage { search_url } => search_url,
        };
        url.split('?').next().unwrap_or(url)
    }
}

impl From<&Marketplace> for Source {
    fn from(m: &Marketplace) -> Self {
        Self {
            name: m.name.clone(),
            kind: SourceKind::HtmlPage {
                search_url: m.search_url.clone(),
            },
            source_type: m.source_type,
        }
    }
}

/// Anything that can turn a search string into raw listings.
pub trait SourceFetcher: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(
        &self,
        search: &str,
        country: &str,
    ) -> impl Future<Output = Result<Vec<RawListing>, SourceError>> + Send;
}

/// Exponential backoff with jitter for retryable fetch failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(30) as u32;
        let exp = 1u64 << shift;
        let base = self
            .base_delay_ms
            .saturating_mul(exp)
            .min(self.max_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.8..1.2);
        Duration::from_millis((base as f64 * jitter) as u64)
    }

    pub async fn run<T, F, Fut>(&self, label: &str, mut f: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0usize;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.max_retries || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        "{} request failed (attempt {}/{}), retrying in {:.1}s",
                        label,
                        attempt,
                        self.max_retries,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// A [`Source`] backed by the real HTTP clients.
pub struct LiveSource {
    source: Source,
    feed: Arc<Client>,
    scraper: Arc<PageScraper>,
    retry: RetryPolicy,
    /// ISO code asked of JSON feeds.
    currency: Option<String>,
}

impl LiveSource {
    pub fn new(source: Source, feed: Arc<Client>, scraper: Arc<PageScraper>, retry: RetryPolicy) -> Self {
        Self {
            source,
            feed,
            scraper,
            retry,
            currency: None,
        }
    }

    pub fn with_currency(mut self, code: &str) -> Self {
        self.currency = Some(code.to_string());
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    async fn fetch_once(&self, search: &str, country: &str) -> Result<Vec<RawListing>, SourceError> {
        match &self.source.kind {
            SourceKind::JsonFeed { endpoint } => {
                let mut query = ListingQuery::new(search)
                    .with_country(country)
                    .with_page_size(50);
                if let Some(code) = &self.currency {
                    query = query.with_currency(code);
                }
                let resp = self.feed.get_listings(endpoint, &query).await?;
                Ok(resp
                    .data
                    .into_iter()
                    .map(|l| match l.source_name {
                        Some(_) => l,
                        None => l.with_source_name(&self.source.name),
                    })
                    .collect())
            }
            SourceKind::HtmlPage { search_url } => Ok(self
                .scraper
                .search(search_url, search, &self.source.name)
                .await?),
        }
    }
}

impl SourceFetcher for LiveSource {
    fn name(&self) -> &str {
        &self.source.name
    }

    async fn fetch(&self, search: &str, country: &str) -> Result<Vec<RawListing>, SourceError> {
        self.retry
            .run(&self.source.name, || self.fetch_once(search, country))
            .await
    }
}
