//! Marketplace directory: which storefronts to query for a product, category
//! and country.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{Clock, MemoryCache};
use crate::locale::LocaleError;

/// The three kinds of storefront a search fans out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    GlobalSuppliers,
    LocalMarkets,
    OnlineMarketplaces,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [
        SourceType::GlobalSuppliers,
        SourceType::LocalMarkets,
        SourceType::OnlineMarketplaces,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceType::GlobalSuppliers => "Global Supplier",
            SourceType::LocalMarkets => "Local Market",
            SourceType::OnlineMarketplaces => "Online Marketplace",
        }
    }
}

/// One storefront and the URL prefix its search text is appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marketplace {
    pub name: String,
    pub search_url: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(skip_deserializing)]
    pub source_type: Option<SourceType>,
}

impl Marketplace {
    /// Whether this storefront carries `category`. An empty category list
    /// carries everything.
    pub fn carries(&self, category: &str) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category))
    }
}

type SourceTable = HashMap<SourceType, Vec<Marketplace>>;

#[derive(Deserialize, Debug)]
struct MarketplaceFile {
    countries: HashMap<String, SourceTable>,
    default: SourceTable,
}

/// Default capacity of the directory's resolution cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
/// Default lifetime of a cached resolution.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Resolves marketplaces per `(product, category, country)` and memoizes
/// the answer in a bounded TTL cache it owns.
pub struct MarketplaceDirectory {
    countries: HashMap<String, SourceTable>,
    default: SourceTable,
    cache: MemoryCache<Arc<Vec<Marketplace>>>,
}

fn tag(mut table: SourceTable) -> SourceTable {
    for (kind, list) in table.iter_mut() {
        for m in list.iter_mut() {
            m.source_type = Some(*kind);
        }
    }
    table
}

impl MarketplaceDirectory {
    /// Parses the directory from YAML content.
    pub fn parse(yaml_content: &str, cache: MemoryCache<Arc<Vec<Marketplace>>>) -> Result<Self, LocaleError> {
        let file: MarketplaceFile = serde_yml::from_str(yaml_content)?;
        let mut countries = HashMap::new();
        for (country, table) in file.countries {
            let key = country.to_lowercase();
            if countries.contains_key(&key) {
                return Err(LocaleError::Duplicate(country));
            }
            countries.insert(key, tag(table));
        }
        Ok(Self {
            countries,
            default: tag(file.default),
            cache,
        })
    }

    /// Loads the directory embedded at compile time with a system-clock cache.
    pub fn load(ttl: Duration, capacity: usize) -> Result<Self, LocaleError> {
        Self::parse(
            include_str!("../../seed_data/marketplaces.yml"),
            MemoryCache::new(ttl, capacity),
        )
    }

    /// Like [`MarketplaceDirectory::load`] with an injected clock.
    pub fn load_with_clock(
        ttl: Duration,
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LocaleError> {
        Self::parse(
            include_str!("../../seed_data/marketplaces.yml"),
            MemoryCache::with_clock(ttl, capacity, clock),
        )
    }

    /// Marketplaces of one source type for `country`, falling back to the
    /// default table when the country or the source type is unknown.
    pub fn for_region(&self, country: &str, source_type: SourceType) -> &[Marketplace] {
        self.countries
            .get(&country.to_lowercase())
            .and_then(|t| t.get(&source_type))
            .or_else(|| self.default.get(&source_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All marketplaces to query for a product, across every source type,
    /// restricted to those carrying `category`.
    pub fn resolve(&self, product: &str, category: &str, country: &str) -> Arc<Vec<Marketplace>> {
        let key = format!(
            "{}|{}|{}",
            product.trim().to_lowercase(),
            category.trim().to_lowercase(),
            country.trim().to_lowercase()
        );
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(key = %key, "marketplace cache hit");
            return hit;
        }

        let resolved: Vec<Marketplace> = SourceType::ALL
            .iter()
            .flat_map(|kind| self.for_region(country, *kind))
            .filter(|m| m.carries(category))
            .cloned()
            .collect();
        let resolved = Arc::new(resolved);
        self.cache.set(key, resolved.clone());
        resolved
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
