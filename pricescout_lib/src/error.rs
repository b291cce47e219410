//! Error types for the library layer.

use std::fmt;

use crate::locale::LocaleError;
use crate::scrape::ScrapeError;

/// Errors returned by [`SearchService`](crate::SearchService) construction,
/// configuration loading and input validation.
#[derive(Debug)]
pub enum PriceScoutError {
    /// User-provided input failed validation.
    InvalidInput(String),
    /// Configuration could not be read or parsed.
    Config(String),
    /// The embedded locale or marketplace tables failed to load.
    Tables(LocaleError),
    /// The HTTP client could not be built.
    Http(ScrapeError),
}

impl fmt::Display for PriceScoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::Config(msg) => write!(f, "Config error: {}", msg),
            Self::Tables(e) => write!(f, "Lookup table error: {}", e),
            Self::Http(e) => write!(f, "HTTP client error: {}", e),
        }
    }
}

impl std::error::Error for PriceScoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tables(e) => Some(e),
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LocaleError> for PriceScoutError {
    fn from(e: LocaleError) -> Self {
        Self::Tables(e)
    }
}

impl From<ScrapeError> for PriceScoutError {
    fn from(e: ScrapeError) -> Self {
        Self::Http(e)
    }
}

impl From<toml::de::Error> for PriceScoutError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
