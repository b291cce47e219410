//! Physical stores near the searched city, looked up on an Overpass-style
//! map endpoint and flagged by how well they match the product.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pricescout_api::user_agent::get_user_agent;

use crate::locale::{find_word, Location};
use crate::scrape::ScrapeError;

/// Most stores asked of the map endpoint.
const MAX_STORES: usize = 30;

/// Shop types that sell what a product keyword names. Keywords are matched
/// as written and with a trailing "s" removed.
const SHOP_TYPES: &[(&str, &[&str])] = &[
    ("mirror", &["glaziery", "interior_decoration", "frame", "optician"]),
    ("glass", &["glaziery", "hardware"]),
    ("window", &["glaziery", "doityourself", "hardware"]),
    ("door", &["doityourself", "hardware", "carpenter"]),
    ("tap", &["hardware", "bathroom_furnishing", "doityourself"]),
    ("faucet", &["hardware", "bathroom_furnishing", "doityourself"]),
    ("pipe", &["hardware", "doityourself"]),
    ("tile", &["tiles", "flooring", "doityourself", "hardware"]),
    ("paint", &["paint", "doityourself", "hardware"]),
    ("laptop", &["computer", "electronics", "mobile_phone"]),
    ("computer", &["computer", "electronics"]),
    ("phone", &["mobile_phone", "electronics"]),
    ("mobile", &["mobile_phone", "electronics"]),
    ("headphone", &["electronics", "hifi", "mobile_phone"]),
    ("tv", &["electronics", "appliance"]),
    ("television", &["electronics", "appliance"]),
    ("fan", &["electronics", "electrical", "houseware", "appliance"]),
    ("crompton", &["electronics", "electrical", "houseware", "appliance"]),
    ("light", &["lighting", "electrical", "electronics"]),
    ("lamp", &["lighting", "electrical"]),
    ("bulb", &["lighting", "electrical"]),
    ("ceiling", &["lighting", "electrical"]),
    ("shoe", &["shoes", "sports"]),
    ("shirt", &["clothes", "boutique", "fashion"]),
    ("chair", &["furniture"]),
    ("sofa", &["furniture"]),
    ("table", &["furniture"]),
    ("furniture", &["furniture"]),
];

const STOP_WORDS: &[&str] = &[
    "price", "prices", "buy", "best", "cheap", "shop", "store", "stores", "near", "for", "the", "and", "with",
    "online", "under", "above", "below", "new", "sale",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalStore {
    pub name: String,
    pub address: String,
    pub city: String,
    pub categories: Vec<String>,
    pub business_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// The shop type or the store name matches the product.
    pub is_relevant: bool,
}

#[derive(Deserialize, Debug)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Deserialize, Debug)]
struct OverpassElement {
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<LatLon>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Deserialize, Debug)]
struct LatLon {
    lat: f64,
    lon: f64,
}

/// Product words worth matching against store names. Location words and
/// filler like "price" are dropped.
pub fn product_keywords(product_query: &str, location: &Location) -> Vec<String> {
    let place = format!("{} {}", location.city, location.matched.as_deref().unwrap_or("")).to_lowercase();
    let place_words: Vec<&str> = place.split_whitespace().collect();
    let mut keywords: Vec<String> = Vec::new();
    for word in product_query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2 && !w.chars().all(|c| c.is_ascii_digit()))
    {
        if STOP_WORDS.contains(&word) || place_words.contains(&word) || word == "in" {
            continue;
        }
        if !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

/// Shop types mapped from `keywords`, in table order of first appearance.
pub fn shop_types_for(keywords: &[String]) -> Vec<&'static str> {
    let mut types: Vec<&'static str> = Vec::new();
    for keyword in keywords {
        let singular = keyword.strip_suffix('s').unwrap_or(keyword);
        let hit = SHOP_TYPES
            .iter()
            .find(|(k, _)| *k == keyword.as_str() || *k == singular);
        if let Some((_, shops)) = hit {
            for shop in shops.iter() {
                if !types.contains(shop) {
                    types.push(*shop);
                }
            }
        }
    }
    types
}

/// A store is relevant when its shop type is one the product maps to, or
/// when its name holds a product keyword as a whole word.
pub fn is_relevant(store_name: &str, business_type: &str, keywords: &[String], shop_types: &[&str]) -> bool {
    if shop_types.iter().any(|t| t.eq_ignore_ascii_case(business_type)) {
        return true;
    }
    let name = store_name.to_lowercase();
    keywords.iter().any(|k| {
        let singular = k.strip_suffix('s').unwrap_or(k);
        find_word(&name, k).is_some() || find_word(&name, singular).is_some()
    })
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Overpass QL for stores in `city`. With mapped shop types only those are
/// asked for; otherwise any shop whose name holds a keyword.
pub fn overpass_query(city: &str, keywords: &[String], shop_types: &[&str]) -> String {
    let filter = if shop_types.is_empty() {
        format!("[\"shop\"][\"name\"~\"{}\",i]", escape(&keywords.join("|")))
    } else {
        format!("[\"shop\"~\"^({})$\"]", shop_types.join("|"))
    };
    format!(
        "[out:json][timeout:25];area[\"name\"=\"{city}\"]->.searchArea;(node{filter}(area.searchArea);way{filter}(area.searchArea););out center {max};",
        city = escape(city),
        filter = filter,
        max = MAX_STORES,
    )
}

fn to_store(element: OverpassElement, city: &str, keywords: &[String], shop_types: &[&str]) -> Option<LocalStore> {
    let tags = element.tags;
    let name = tags.get("name")?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let business_type = tags.get("shop").cloned().unwrap_or_default();
    let categories: Vec<String> = business_type
        .split(';')
        .map(|c| c.trim().replace('_', " "))
        .filter(|c| !c.is_empty())
        .collect();
    let address = ["addr:housenumber", "addr:street", "addr:suburb"]
        .iter()
        .filter_map(|k| tags.get(*k))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let store_city = tags.get("addr:city").cloned().unwrap_or_else(|| city.to_string());
    let address = if address.is_empty() { store_city.clone() } else { address };
    let (lat, lon) = match (element.lat, element.lon, element.center) {
        (Some(lat), Some(lon), _) => (Some(lat), Some(lon)),
        (_, _, Some(c)) => (Some(c.lat), Some(c.lon)),
        _ => (None, None),
    };
    let is_relevant = is_relevant(&name, &business_type, keywords, shop_types);
    Some(LocalStore {
        name,
        address,
        city: store_city,
        categories,
        business_type,
        lat,
        lon,
        is_relevant,
    })
}

/// Client for the map endpoint.
pub struct LocalStoreFinder {
    http: reqwest::Client,
    endpoint: String,
}

impl LocalStoreFinder {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }

    /// Stores in `location.city` for `product_query`, relevant ones first.
    /// Any failure is logged and yields no stores.
    pub async fn search(&self, product_query: &str, location: &Location) -> Vec<LocalStore> {
        let keywords = product_keywords(product_query, location);
        if keywords.is_empty() {
            return Vec::new();
        }
        match self.fetch(&keywords, &location.city).await {
            Ok(stores) => {
                tracing::debug!(city = %location.city, count = stores.len(), "local stores");
                stores
            }
            Err(e) => {
                tracing::warn!("local store search in {} failed: {}", location.city, e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self, keywords: &[String], city: &str) -> Result<Vec<LocalStore>, ScrapeError> {
        let shop_types = shop_types_for(keywords);
        let query = overpass_query(city, keywords, &shop_types);
        let resp = self
            .http
            .post(&self.endpoint)
            .form(&[("data", query.as_str())])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus { status });
        }
        let body: OverpassResponse = resp.json().await?;
        let mut stores: Vec<LocalStore> = body
            .elements
            .into_iter()
            .filter_map(|e| to_store(e, city, keywords, &shop_types))
            .take(MAX_STORES)
            .collect();
        stores.sort_by_key(|s| !s.is_relevant);
        Ok(stores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bangalore() -> Location {
        Location {
            city: "Bangalore".to_string(),
            state: "Karnataka".to_string(),
            country: "india".to_string(),
            matched: Some("bangalore".to_string()),
        }
    }

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keywords_skip_city_and_filler() {
        assert_eq!(product_keywords("mirror price", &bangalore()), words(&["mirror"]));
        assert_eq!(
            product_keywords("crompton fan in bangalore", &bangalore()),
            words(&["crompton", "fan"])
        );
        assert!(product_keywords("price in Bangalore", &bangalore()).is_empty());
    }

    #[test]
    fn plural_keywords_map_to_shop_types() {
        let types = shop_types_for(&words(&["sliding", "windows"]));
        assert_eq!(types, vec!["glaziery", "doityourself", "hardware"]);
        assert!(shop_types_for(&words(&["ceiling", "lights"])).contains(&"lighting"));
        assert!(shop_types_for(&words(&["widget"])).is_empty());
    }

    #[test]
    fn relevance_needs_whole_words() {
        let tiles = words(&["tiles"]);
        assert!(is_relevant("Ceramic Tiles Depot", "", &tiles, &[]));
        assert!(is_relevant("Tile Hub", "", &tiles, &[]));
        assert!(!is_relevant("Bangalore Textiles", "clothes", &tiles, &[]));
        assert!(!is_relevant("Bangalore Mart", "supermarket", &words(&["mirror"]), &["glaziery"]));
        assert!(is_relevant("Sri Glass House", "glaziery", &words(&["mirror"]), &["glaziery"]));
    }

    #[test]
    fn query_asks_only_for_mapped_shop_types() {
        let q = overpass_query("Bangalore", &words(&["fan"]), &["electronics", "electrical"]);
        assert!(q.contains("area[\"name\"=\"Bangalore\"]"));
        assert!(q.contains("[\"shop\"~\"^(electronics|electrical)$\"]"));
        assert!(!q.contains("[\"name\"~"));
        let q = overpass_query("Bangalore", &words(&["widget"]), &[]);
        assert!(q.contains("[\"name\"~\"widget\",i]"));
    }

    #[test]
    fn element_without_name_skipped() {
        let element: OverpassElement = serde_json::from_str(r#"{"type":"node","lat":1.0,"lon":2.0,"tags":{"shop":"hardware"}}"#).unwrap();
        assert!(to_store(element, "Pune", &[], &[]).is_none());
    }

    #[test]
    fn way_uses_center_and_address_falls_back_to_city() {
        let element: OverpassElement = serde_json::from_str(
            r#"{"type":"way","center":{"lat":12.9,"lon":77.6},"tags":{"name":"Tap World","shop":"bathroom_furnishing"}}"#,
        )
        .unwrap();
        let store = to_store(element, "Bangalore", &words(&["tap"]), &["hardware", "bathroom_furnishing"]).unwrap();
        assert_eq!(store.lat, Some(12.9));
        assert_eq!(store.address, "Bangalore");
        assert_eq!(store.city, "Bangalore");
        assert_eq!(store.categories, words(&["bathroom furnishing"]));
        assert!(store.is_relevant);
    }
}
