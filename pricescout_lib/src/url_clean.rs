//! Product URL cleanup and product-page detection.
//!
//! Marketplace links arrive loaded with tracking parameters. Collapsing them to
//! the product identifier lets the deduplicator see two tracked links to the
//! same listing as one.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

fn asin_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/(?:dp|gp/product|product)/([A-Z0-9]{10})").expect("asin regex is valid")
    })
}

fn asin_re_any_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)/(?:dp|gp/product|product)/[a-z0-9]{10}").expect("asin regex is valid")
    })
}

fn flipkart_pid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/p/[a-zA-Z0-9]{10,}").expect("pid regex is valid"))
}

const SEARCH_MARKERS: &[&str] = &[
    "/search?",
    "/search/",
    "/category/",
    "/categories/",
    "?q=",
    "?keyword=",
];

fn host_contains(url: &Url, needle: &str) -> bool {
    url.host_str()
        .map(|h| h.to_ascii_lowercase().contains(needle))
        .unwrap_or(false)
}

fn without_query(url: &Url) -> String {
    let mut stripped = url.clone();
    stripped.set_query(None);
    stripped.set_fragment(None);
    stripped.to_string()
}

/// Strips tracking parameters from marketplace product links.
///
/// Amazon links with an ASIN collapse to `https://<host>/dp/<ASIN>`; Amazon
/// links without one keep only the `k` parameter. Flipkart and Snapdeal links
/// lose their query string. Anything else, including input that does not parse
/// as a URL, is returned unchanged.
pub fn clean_product_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };

    if host_contains(&url, "amazon") {
        if let Some(cap) = asin_re().captures(url.path()) {
            let host = url.host_str().unwrap_or("www.amazon.in");
            return format!("https://{}/dp/{}", host, &cap[1]);
        }
        let keyword = url
            .query_pairs()
            .find(|(k, _)| k == "k")
            .map(|(_, v)| v.into_owned());
        let mut cleaned = url.clone();
        cleaned.set_fragment(None);
        cleaned.set_query(None);
        if let Some(k) = keyword {
            cleaned.query_pairs_mut().append_pair("k", &k);
        }
        return cleaned.to_string();
    }

    if host_contains(&url, "flipkart") || host_contains(&url, "snapdeal") {
        return without_query(&url);
    }

    raw.to_string()
}

/// Whether `raw` points at a single product page rather than a search or
/// category listing.
pub fn is_valid_product_url(raw: &str) -> bool {
    if raw.len() < 10 {
        return false;
    }
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return false;
    }

    let path = url.path().to_ascii_lowercase();

    if host_contains(&url, "amazon") {
        return asin_re_any_case().is_match(url.path());
    }
    if host_contains(&url, "flipkart") {
        return path.contains("/p/") && flipkart_pid_re().is_match(url.path());
    }
    if host_contains(&url, "snapdeal") {
        return path.contains("/product/");
    }

    let lower = raw.to_ascii_lowercase();
    if SEARCH_MARKERS.iter().any(|m| lower.contains(m)) {
        return false;
    }
    url.path().len() > 5
}
