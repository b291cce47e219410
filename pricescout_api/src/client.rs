//! HTTP client for JSON listing feeds.

use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    query::{ListingQuery, Query},
    types::ListingsResponse,
    user_agent::get_user_agent,
    Error,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for listing feeds that speak the `{"meta": .., "data": [..]}`
/// envelope.
///
/// Sends requests with browser-like headers and a randomized user agent. Each
/// request builds a fresh `reqwest::Client` so the user agent rotates.
pub struct Client {
    timeout: Duration,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client with a 30-second request timeout.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creates a new client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn get_url(&self, endpoint: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(endpoint).map_err(|e| {
            tracing::error!("Invalid feed URL '{}': {}", endpoint, e);
            Error::RequestFailed
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    async fn get<T, Q>(&self, endpoint: &str, query: Option<&Q>) -> Result<T, Error>
    where
        T: DeserializeOwned,
        Q: Query,
    {
        let url = self.get_url(endpoint, query)?;
        let client = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        let resp = client
            .get(url)
            .header("accept", "application/json, text/plain, */*")
            .header("accept-language", "en-IN,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get listings: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let parsed = serde_json::from_str::<T>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse listings: {} | body: {}", e, snippet);
            Error::RequestFailed
        })?;

        Ok(parsed)
    }

    /// Fetches one page of listings from the feed at `endpoint`.
    pub async fn get_listings(
        &self,
        endpoint: &str,
        query: &ListingQuery,
    ) -> Result<ListingsResponse, Error> {
        self.get::<ListingsResponse, ListingQuery>(endpoint, Some(query))
            .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "₹".repeat(1000);
        let out = truncate_body(&body);
        assert!(out.ends_with("...[truncated]"));
    }

    #[test]
    fn short_body_untouched() {
        assert_eq!(truncate_body("oops"), "oops");
    }
}
