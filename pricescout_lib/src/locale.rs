//! Location detection and currency lookup.
//!
//! Tables are static configuration loaded from `seed_data/locales.yml` at
//! compile time and parsed once into immutable maps, the same way the
//! marketplace directory loads its data.

use std::collections::HashMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for locale table loading.
#[derive(Error, Debug)]
pub enum LocaleError {
    #[error("Failed to parse locale YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Duplicate locale key: {0}")]
    Duplicate(String),
    #[error("Locale file has no '{0}' currency entry")]
    MissingFallback(String),
}

/// Country used when nothing in the query names a place.
pub const GLOBAL_COUNTRY: &str = "global";

/// Currency of one country. `rate` converts an INR amount into it.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Currency {
    pub symbol: String,
    pub code: String,
    pub rate: f64,
}

/// Converts amounts written in any known currency into one target currency.
///
/// Every table rate is relative to INR, so an amount is first read in INR
/// terms (where the plausibility band applies) and then multiplied by the
/// target rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    target: Currency,
    /// Symbol to INR rate.
    rates: HashMap<String, f64>,
}

impl Conversion {
    /// A conversion that only knows its target currency.
    pub fn to(target: Currency) -> Self {
        let rates = HashMap::from([(target.symbol.clone(), target.rate)]);
        Self { target, rates }
    }

    pub fn target(&self) -> &Currency {
        &self.target
    }

    /// Factor that turns an amount written with `symbol` into INR. Unknown
    /// symbols are read as the target currency.
    pub fn base_factor(&self, symbol: &str) -> f64 {
        let rate = self.rates.get(symbol).copied().unwrap_or(self.target.rate);
        if rate > 0.0 {
            1.0 / rate
        } else {
            1.0
        }
    }

    /// An INR amount in the target currency, to two decimals.
    pub fn from_base(&self, amount: f64) -> f64 {
        (amount * self.target.rate * 100.0).round() / 100.0
    }
}

/// Where a query is asking about.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub country: String,
    /// The phrase in the query that selected this location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
}

const ANY_CITY: &str = "Various Cities";

impl Location {
    /// A whole country, with no particular city.
    pub fn country(country: &str) -> Self {
        Self {
            city: ANY_CITY.to_string(),
            state: "Nationwide".to_string(),
            country: country.to_lowercase(),
            matched: None,
        }
    }

    /// Whether a particular city was named.
    pub fn has_city(&self) -> bool {
        self.country != GLOBAL_COUNTRY && self.city != ANY_CITY
    }

    pub fn global() -> Self {
        Self {
            city: "Global".to_string(),
            state: "International".to_string(),
            country: GLOBAL_COUNTRY.to_string(),
            matched: None,
        }
    }
}

#[derive(Deserialize, Debug)]
struct LocaleFile {
    currencies: Vec<CurrencyEntry>,
    cities: Vec<CityEntry>,
    country_keywords: Vec<KeywordEntry>,
}

#[derive(Deserialize, Debug)]
struct CurrencyEntry {
    country: String,
    #[serde(flatten)]
    currency: Currency,
}

#[derive(Deserialize, Debug)]
struct CityEntry {
    key: String,
    city: String,
    state: String,
    country: String,
}

#[derive(Deserialize, Debug)]
struct KeywordEntry {
    keyword: String,
    country: String,
}

/// Immutable currency, city and country keyword tables.
#[derive(Debug, Clone)]
pub struct LocaleTable {
    currencies: HashMap<String, Currency>,
    /// Longest key first so "new york" beats "york".
    cities: Vec<(String, Location)>,
    country_keywords: Vec<(String, String)>,
}

/// Byte range of `needle` in `haystack` where it stands as a whole word.
/// Both are expected lowercased.
pub(crate) fn find_word(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let is_word = |c: char| c.is_alphanumeric();
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start].chars().next_back().map_or(true, |c| !is_word(c));
        let after_ok = haystack[end..].chars().next().map_or(true, |c| !is_word(c));
        if before_ok && after_ok {
            return Some(start..end);
        }
        from = start + needle.chars().next().map_or(1, char::len_utf8);
    }
    None
}

impl LocaleTable {
    /// Parses locale tables from YAML content.
    pub fn parse(yaml_content: &str) -> Result<Self, LocaleError> {
        let file: LocaleFile = serde_yml::from_str(yaml_content)?;

        let mut currencies = HashMap::new();
        for entry in file.currencies {
            let key = entry.country.to_lowercase();
            if currencies.contains_key(&key) {
                return Err(LocaleError::Duplicate(entry.country));
            }
            currencies.insert(key, entry.currency);
        }
        if !currencies.contains_key(GLOBAL_COUNTRY) {
            return Err(LocaleError::MissingFallback(GLOBAL_COUNTRY.to_string()));
        }

        let mut cities: Vec<(String, Location)> = Vec::new();
        for entry in file.cities {
            let key = entry.key.to_lowercase();
            if cities.iter().any(|(k, _)| *k == key) {
                return Err(LocaleError::Duplicate(entry.key));
            }
            cities.push((
                key,
                Location {
                    city: entry.city,
                    state: entry.state,
                    country: entry.country.to_lowercase(),
                    matched: None,
                },
            ));
        }
        cities.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut country_keywords: Vec<(String, String)> = Vec::new();
        for entry in file.country_keywords {
            let key = entry.keyword.to_lowercase();
            if country_keywords.iter().any(|(k, _)| *k == key) {
                return Err(LocaleError::Duplicate(entry.keyword));
            }
            country_keywords.push((key, entry.country.to_lowercase()));
        }
        country_keywords.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(Self {
            currencies,
            cities,
            country_keywords,
        })
    }

    /// Loads the tables embedded at compile time.
    pub fn load() -> Result<Self, LocaleError> {
        Self::parse(include_str!("../../seed_data/locales.yml"))
    }

    /// Finds the location a query refers to. Country keywords win over city
    /// names; with neither the global location is returned.
    pub fn detect_location(&self, query: &str) -> Location {
        let lower = query.to_lowercase();

        for (keyword, country) in &self.country_keywords {
            if find_word(&lower, keyword).is_some() {
                return Location {
                    matched: Some(keyword.clone()),
                    ..Location::country(country)
                };
            }
        }

        for (key, location) in &self.cities {
            if find_word(&lower, key).is_some() {
                return Location {
                    matched: Some(key.clone()),
                    ..location.clone()
                };
            }
        }

        Location::global()
    }

    /// Removes the phrase that selected `location` from `query`, along with a
    /// leading "in", "near" or "at". Returns the trimmed query unchanged if
    /// nothing would be left.
    pub fn strip_location(&self, query: &str, location: &Location) -> String {
        let Some(matched) = location.matched.as_deref() else {
            return query.trim().to_string();
        };
        let lower = query.to_lowercase();
        // Lowercasing can change byte lengths outside ASCII; only strip when
        // offsets line up.
        if lower.len() != query.len() {
            return query.trim().to_string();
        }
        let Some(range) = find_word(&lower, matched) else {
            return query.trim().to_string();
        };

        let mut head = query[..range.start].trim_end().to_string();
        let head_lower = head.to_lowercase();
        for prep in ["in", "near", "at"] {
            if head_lower == prep || head_lower.ends_with(&format!(" {}", prep)) {
                head.truncate(head.len() - prep.len());
                break;
            }
        }
        let stripped = format!("{} {}", head.trim_end(), &query[range.end..]);
        let stripped = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
        if stripped.is_empty() {
            query.trim().to_string()
        } else {
            stripped
        }
    }

    /// Currency for `country`, falling back to the global entry.
    pub fn currency(&self, country: &str) -> Currency {
        self.currencies
            .get(&country.to_lowercase())
            .or_else(|| self.currencies.get(GLOBAL_COUNTRY))
            .cloned()
            .unwrap_or_else(|| Currency {
                symbol: "$".to_string(),
                code: "USD".to_string(),
                rate: 0.012,
            })
    }

    /// Conversion into the currency of `country`. When two countries share
    /// a symbol, the target's own rate wins.
    pub fn conversion(&self, country: &str) -> Conversion {
        let mut conversion = Conversion::to(self.currency(country));
        for currency in self.currencies.values() {
            conversion
                .rates
                .entry(currency.symbol.clone())
                .or_insert(currency.rate);
        }
        conversion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LocaleTable {
        LocaleTable::load().unwrap()
    }

    #[test]
    fn embedded_tables_load() {
        let t = table();
        assert_eq!(t.currency("india").code, "INR");
        assert_eq!(t.currency("UK").symbol, "£");
    }

    #[test]
    fn unknown_country_falls_back_to_global() {
        let c = table().currency("atlantis");
        assert_eq!(c.code, "USD");
        assert_eq!(c.rate, 0.012);
    }

    #[test]
    fn conversion_into_inr() {
        let c = table().conversion("india");
        assert_eq!(c.target().symbol, "₹");
        assert_eq!(c.base_factor("₹"), 1.0);
        let inr = 449.99 * c.base_factor("$");
        assert_eq!(c.from_base(inr), 37499.17);
        assert_eq!(c.from_base(1.0 / 0.0095 * 100.0), 10526.32);
    }

    #[test]
    fn conversion_into_usd() {
        let c = table().conversion("usa");
        let inr = 449.99 * c.base_factor("$");
        assert_eq!(c.from_base(inr), 449.99);
        assert_eq!(c.from_base(74_999.0 * c.base_factor("₹")), 899.99);
        // Unknown symbols read as the target currency.
        assert_eq!(c.base_factor("Ƀ"), c.base_factor("$"));
    }

    #[test]
    fn country_keyword_beats_city() {
        let loc = table().detect_location("laptop in dubai");
        assert_eq!(loc.country, "uae");
        assert_eq!(loc.city, "Various Cities");
    }

    #[test]
    fn city_detection() {
        let loc = table().detect_location("mirror in Bangalore");
        assert_eq!(loc.city, "Bangalore");
        assert_eq!(loc.state, "Karnataka");
        assert_eq!(loc.country, "india");
        assert_eq!(loc.matched.as_deref(), Some("bangalore"));
        assert!(loc.has_city());
    }

    #[test]
    fn country_and_global_have_no_city() {
        assert!(!table().detect_location("laptop in dubai").has_city());
        assert!(!Location::global().has_city());
        assert!(!Location::country("india").has_city());
    }

    #[test]
    fn multi_word_city() {
        let loc = table().detect_location("sofa new york");
        assert_eq!(loc.city, "New York");
    }

    #[test]
    fn keyword_needs_word_boundary() {
        // "uk" inside "ukulele" is not the United Kingdom
        assert_eq!(table().detect_location("ukulele").country, GLOBAL_COUNTRY);
        assert_eq!(table().detect_location("bluetooth speaker").country, GLOBAL_COUNTRY);
    }

    #[test]
    fn default_is_global() {
        let loc = table().detect_location("wireless mouse");
        assert_eq!(loc, Location::global());
    }

    #[test]
    fn strip_location_drops_preposition() {
        let t = table();
        let loc = t.detect_location("mirror in bangalore");
        assert_eq!(t.strip_location("mirror in bangalore", &loc), "mirror");
        let loc = t.detect_location("ceiling fan near Pune price");
        assert_eq!(t.strip_location("ceiling fan near Pune price", &loc), "ceiling fan price");
    }

    #[test]
    fn strip_location_keeps_query_when_only_location() {
        let t = table();
        let loc = t.detect_location("in london");
        assert_eq!(t.strip_location("in london", &loc), "in london");
    }

    #[test]
    fn duplicate_keys_rejected() {
        let yaml = r#"
currencies:
  - { country: global, symbol: "$", code: USD, rate: 0.012 }
cities:
  - { key: pune, city: Pune, state: Maharashtra, country: india }
  - { key: Pune, city: Pune, state: Maharashtra, country: india }
country_keywords: []
"#;
        assert!(matches!(
            LocaleTable::parse(yaml),
            Err(LocaleError::Duplicate(k)) if k == "Pune"
        ));
    }

    #[test]
    fn missing_global_currency_rejected() {
        let yaml = "currencies: []\ncities: []\ncountry_keywords: []\n";
        assert!(matches!(
            LocaleTable::parse(yaml),
            Err(LocaleError::MissingFallback(_))
        ));
    }

    #[test]
    fn invalid_yaml_rejected() {
        assert!(matches!(
            LocaleTable::parse("currencies: [unclosed"),
            Err(LocaleError::YamlParse(_))
        ));
    }
}
