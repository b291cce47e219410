//! HTML search-page scraping: product anchors paired with their price text.

use std::time::Duration;

use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use pricescout_api::types::RawListing;
use pricescout_api::user_agent::get_user_agent;

use crate::price_parser::extract_price;

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}")]
    HttpStatus { status: StatusCode },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ScrapeError {
    /// Transport failures, 429 and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::HttpStatus { status } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::InvalidUrl(_) => false,
        }
    }
}

/// Characters of sibling text searched for a price after an anchor.
const PRICE_WINDOW: usize = 600;
/// Longest price text kept on a listing.
const MAX_PRICE_TEXT: usize = 300;
/// How many single-anchor ancestors are tried as the listing's card.
const CARD_DEPTH: usize = 3;

pub struct PageScraper {
    http: reqwest::Client,
}

impl PageScraper {
    pub fn with_timeout(timeout: Duration) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Fetches `search_url` with `search` appended and extracts the listings
    /// that carry a plausible price.
    pub async fn search(
        &self,
        search_url: &str,
        search: &str,
        source_name: &str,
    ) -> Result<Vec<RawListing>, ScrapeError> {
        let url = build_search_url(search_url, search);
        let base = Url::parse(&url).map_err(|e| ScrapeError::InvalidUrl(format!("{}: {}", url, e)))?;
        let html = self.fetch_html(&url).await?;
        let listings = extract_listings(&html, &base, source_name);
        tracing::debug!(source = source_name, count = listings.len(), "scraped listings");
        Ok(listings)
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self
            .http
            .get(url)
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-IN,en;q=0.9")
            .header("upgrade-insecure-requests", "1")
            .header("cache-control", "no-cache")
            .header("pragma", "no-cache")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ScrapeError::HttpStatus {
                status: resp.status(),
            });
        }

        Ok(resp.text().await?)
    }
}

/// Appends the form-encoded search text to a search URL prefix.
pub fn build_search_url(search_url: &str, search: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(search.as_bytes()).collect();
    format!("{}{}", search_url, encoded)
}

/// Visible text nodes under `el`, each with whitespace collapsed.
fn text_chunks(el: ElementRef<'_>) -> Vec<String> {
    el.descendants()
        .filter(|n| {
            !n.parent()
                .and_then(|p| p.value().as_element().map(|e| matches!(e.name(), "script" | "style")))
                .unwrap_or(false)
        })
        .filter_map(|n| n.value().as_text().map(|t| collapse(t)))
        .filter(|t| !t.is_empty())
        .collect()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn holds_anchor(el: ElementRef<'_>, anchors: &Selector) -> bool {
    el.value().name() == "a" || el.select(anchors).next().is_some()
}

/// Text of the siblings after `anchor`, up to the next sibling holding a link.
fn following_text(anchor: ElementRef<'_>, anchors: &Selector) -> String {
    let mut text = String::new();
    for sibling in anchor.next_siblings() {
        let chunks = match ElementRef::wrap(sibling) {
            Some(el) if holds_anchor(el, anchors) => break,
            Some(el) => text_chunks(el),
            None => sibling
                .value()
                .as_text()
                .map(|t| collapse(t))
                .filter(|t| !t.is_empty())
                .into_iter()
                .collect(),
        };
        for chunk in chunks {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&chunk);
        }
        if text.chars().count() >= PRICE_WINDOW {
            break;
        }
    }
    text
}

/// Text of the nearest ancestor that wraps this anchor and no other link
/// and mentions a price.
fn card_text(anchor: ElementRef<'_>, anchors: &Selector) -> Option<String> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(CARD_DEPTH)
        .take_while(|card| card.select(anchors).count() == 1)
        .map(|card| text_chunks(card).join(" "))
        .find(|text| extract_price(text).is_some())
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Pairs each link with its price text. The price is looked for in the
/// anchor's own text, then in the siblings that follow it, then in the card
/// that wraps it. Links without a plausible price are dropped.
pub fn extract_listings(html: &str, base: &Url, source_name: &str) -> Vec<RawListing> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.starts_with('#') || href.to_ascii_lowercase().starts_with("javascript:") {
            continue;
        }

        let (priced, named): (Vec<String>, Vec<String>) = text_chunks(anchor)
            .into_iter()
            .partition(|chunk| extract_price(chunk).is_some());
        let name = named.join(" ");
        if name.chars().count() < 3 {
            continue;
        }

        let price_text = if !priced.is_empty() {
            priced.join(" ")
        } else {
            let after = following_text(anchor, &anchors);
            if extract_price(&after).is_some() {
                after
            } else {
                match card_text(anchor, &anchors) {
                    Some(text) => text,
                    None => continue,
                }
            }
        };

        let Ok(link) = base.join(href) else {
            continue;
        };
        listings.push(
            RawListing::new(&name, &truncate_chars(&price_text, MAX_PRICE_TEXT), link.as_str())
                .with_source_name(source_name),
        );
    }

    listings
}
