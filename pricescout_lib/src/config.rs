//! Search configuration: defaults, a TOML file, then `PRICESCOUT_*` env vars.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PriceScoutError;
use crate::sources::{RetryPolicy, Source};

/// GST rates applied to bulk comparison totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GstRates {
    pub cgst: f64,
    pub sgst: f64,
}

impl Default for GstRates {
    fn default() -> Self {
        Self {
            cgst: 0.09,
            sgst: 0.09,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fetches in flight at once.
    pub concurrency: usize,
    pub fetch_timeout_secs: u64,
    /// Bulk rows searched concurrently.
    pub bulk_batch_size: usize,
    /// Country whose market and currency bulk rows are compared against.
    pub bulk_country: String,
    pub retry_max: usize,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    /// Also query the marketplaces listed in the embedded directory.
    pub use_directory: bool,
    pub sources: Vec<Source>,
    pub gst: GstRates,
    /// Overpass-style endpoint for local store lookup. Unset skips the lookup.
    pub map_endpoint: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            concurrency: 8,
            fetch_timeout_secs: 20,
            bulk_batch_size: 5,
            bulk_country: "india".to_string(),
            retry_max: retry.max_retries,
            retry_base_ms: retry.base_delay_ms,
            retry_max_ms: retry.max_delay_ms,
            cache_ttl_secs: 3600,
            cache_capacity: 256,
            use_directory: true,
            sources: Vec::new(),
            gst: GstRates::default(),
            map_endpoint: None,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

impl SearchConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, PriceScoutError> {
        let config: Self = toml::from_str(content)?;
        config.validate()
    }

    /// Reads a TOML file, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, PriceScoutError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PriceScoutError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)?.with_env_overrides().validate()
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, PriceScoutError> {
        Self::default().with_env_overrides().validate()
    }

    /// Applies `PRICESCOUT_*` variables on top of the current values.
    /// Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        self.concurrency = env_usize("PRICESCOUT_CONCURRENCY", self.concurrency);
        self.fetch_timeout_secs = env_u64("PRICESCOUT_FETCH_TIMEOUT_SECS", self.fetch_timeout_secs);
        self.bulk_batch_size = env_usize("PRICESCOUT_BULK_BATCH_SIZE", self.bulk_batch_size);
        if let Ok(country) = std::env::var("PRICESCOUT_BULK_COUNTRY") {
            if !country.trim().is_empty() {
                self.bulk_country = country.trim().to_lowercase();
            }
        }
        self.retry_max = env_usize("PRICESCOUT_RETRY_MAX", self.retry_max);
        self.retry_base_ms = env_u64("PRICESCOUT_RETRY_BASE_MS", self.retry_base_ms);
        self.retry_max_ms = env_u64("PRICESCOUT_RETRY_MAX_MS", self.retry_max_ms);
        self.cache_ttl_secs = env_u64("PRICESCOUT_CACHE_TTL_SECS", self.cache_ttl_secs);
        self.cache_capacity = env_usize("PRICESCOUT_CACHE_CAPACITY", self.cache_capacity);
        if let Ok(endpoint) = std::env::var("PRICESCOUT_MAP_ENDPOINT") {
            let endpoint = endpoint.trim();
            self.map_endpoint = (!endpoint.is_empty()).then(|| endpoint.to_string());
        }
        self
    }

    fn validate(self) -> Result<Self, PriceScoutError> {
        if self.concurrency == 0 {
            return Err(PriceScoutError::Config("concurrency must be at least 1".into()));
        }
        if self.bulk_batch_size == 0 {
            return Err(PriceScoutError::Config("bulk_batch_size must be at least 1".into()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(PriceScoutError::Config("fetch_timeout_secs must be at least 1".into()));
        }
        if self.gst.cgst < 0.0 || self.gst.sgst < 0.0 {
            return Err(PriceScoutError::Config("GST rates must not be negative".into()));
        }
        Ok(self)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry_max,
            base_delay_ms: self.retry_base_ms,
            max_delay_ms: self.retry_max_ms,
        }
    }
}
