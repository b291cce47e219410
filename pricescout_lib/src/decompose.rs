//! Free-text query decomposition and search-phrase generation.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Structured view of one search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDecomposition {
    /// The query with price phrases removed.
    pub primary_query: String,
    /// Search phrasings to dispatch, unique and in priority order.
    pub variations: Vec<String>,
    pub max_price: Option<f64>,
    pub min_price: Option<f64>,
    pub brand: Option<String>,
    pub product_type: Option<String>,
}

const BRANDS: &[&str] = &[
    "samsung", "apple", "iphone", "oneplus", "xiaomi", "redmi", "realme", "oppo", "vivo",
    "motorola", "nokia", "google", "sony", "lg", "dell", "hp", "lenovo", "asus", "acer", "msi",
    "boat", "jbl", "bose", "sennheiser", "philips", "havells", "bajaj", "whirlpool", "godrej",
    "nike", "adidas", "puma", "reebok", "bata", "woodland", "canon", "nikon", "tcl", "mi",
];

/// Checked in order; longer and more specific names come first so "headphone"
/// wins over "phone".
const PRODUCT_TYPES: &[&str] = &[
    "washing machine", "air conditioner", "smartphone", "headphone", "earphone", "earbuds",
    "television", "refrigerator", "laptop", "notebook", "tablet", "monitor", "keyboard",
    "printer", "speaker", "charger", "camera", "mattress", "t-shirt", "mobile", "phone",
    "watch", "shirt", "jeans", "shoe", "sneaker", "mirror", "chair", "table", "sofa", "cable",
    "mouse", "fridge", "light", "fan", "tv",
];

/// A price amount: a number with a `k` suffix, or one of at least three
/// characters so "under 2 years" is not a price. Three groups: the
/// `k`-suffixed number, the `k`, the plain number.
const AMOUNT: &str = r"(?:rs\.?|₹|inr)?\s*(?:([0-9][0-9,]*(?:\.[0-9]+)?)\s*(k)\b|([0-9][0-9,]{2,}(?:\.[0-9]+)?)\b)";

fn between_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\bbetween\s+{}\s*(?:and|to|-)\s*{}", AMOUNT, AMOUNT))
            .expect("between regex is valid")
    })
}

fn max_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(?:under|below|less\s+than|up\s*to|within|max(?:imum)?)\s+{}",
            AMOUNT
        ))
        .expect("max price regex is valid")
    })
}

fn min_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(?:above|over|more\s+than|min(?:imum)?|starting(?:\s+from)?)\s+{}",
            AMOUNT
        ))
        .expect("min price regex is valid")
    })
}

fn brand_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b({})\b", BRANDS.join("|"))).expect("brand regex is valid")
    })
}

/// The amount whose three [`AMOUNT`] groups start at `first`.
fn amount(caps: &Captures<'_>, first: usize) -> Option<f64> {
    let raw = caps.get(first).or_else(|| caps.get(first + 2))?.as_str().replace(',', "");
    let n: f64 = raw.parse().ok()?;
    Some(if caps.get(first + 1).is_some() { n * 1000.0 } else { n })
}

type Span = std::ops::Range<usize>;

fn take_between(text: &str) -> Option<(Span, Option<f64>, Option<f64>)> {
    let caps = between_re().captures(text)?;
    let span = caps.get(0)?.range();
    Some((span, amount(&caps, 1), amount(&caps, 4)))
}

fn take_single(re: &Regex, text: &str) -> Option<(Span, Option<f64>)> {
    let caps = re.captures(text)?;
    let span = caps.get(0)?.range();
    Some((span, amount(&caps, 1)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits a query into price constraints, brand, product type and search
/// variations.
pub fn decompose(query: &str) -> QueryDecomposition {
    let mut text = query.to_string();
    let mut max_price = None;
    let mut min_price = None;

    if let Some((span, low, high)) = take_between(&text) {
        min_price = low;
        max_price = high;
        text.replace_range(span, " ");
    }
    if max_price.is_none() {
        if let Some((span, value)) = take_single(max_re(), &text) {
            max_price = value;
            text.replace_range(span, " ");
        }
    }
    if min_price.is_none() {
        if let Some((span, value)) = take_single(min_re(), &text) {
            min_price = value;
            text.replace_range(span, " ");
        }
    }

    let mut primary_query = collapse_whitespace(&text);
    if primary_query.is_empty() {
        primary_query = collapse_whitespace(query);
    }

    let lower = primary_query.to_lowercase();
    let brand = brand_re()
        .captures(&lower)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let product_type = PRODUCT_TYPES
        .iter()
        .find(|t| lower.contains(*t))
        .map(|t| t.to_string());

    let mut candidates = vec![primary_query.clone()];
    if let (Some(b), Some(t)) = (&brand, &product_type) {
        candidates.push(format!("{} {}", b, t));
    }
    if let Some(t) = &product_type {
        candidates.push(t.clone());
        if let Some(b) = &brand {
            if !t.contains(' ') {
                candidates.push(b.clone());
            }
        }
    }

    let mut variations: Vec<String> = Vec::new();
    for v in candidates {
        if !variations.iter().any(|seen| seen.eq_ignore_ascii_case(&v)) {
            variations.push(v);
        }
    }

    QueryDecomposition {
        primary_query,
        variations,
        max_price,
        min_price,
        brand,
        product_type,
    }
}

fn dimension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[0-9]+(?:\.[0-9]+)?\s*[x×*]\s*[0-9]+(?:\.[0-9]+)?(?:mm|cm|m|in|ft)?$")
            .expect("dimension regex is valid")
    })
}

const MAX_SIMPLIFIED_WORDS: usize = 6;

fn is_model_code(token: &str) -> bool {
    token.chars().count() >= 5
        && token.chars().any(|c| c.is_ascii_alphabetic())
        && token.chars().any(|c| c.is_ascii_digit())
}

/// Turns a technical line-item name into search text.
///
/// Brackets are dropped but their content kept; numbers, dimensions
/// (`12x12`), model codes and symbol-only tokens are removed; at most six
/// words survive. Falls back to the trimmed input if nothing is left.
pub fn simplify_product_query(item: &str) -> String {
    let unbracketed: String = item
        .chars()
        .map(|c| if "()[]{}".contains(c) { ' ' } else { c })
        .collect();

    let words: Vec<&str> = unbracketed
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c == ',' || c == ';' || c == ':'))
        .filter(|w| !w.is_empty())
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ','))
        .filter(|w| !dimension_re().is_match(w))
        .filter(|w| !is_model_code(w))
        .take(MAX_SIMPLIFIED_WORDS)
        .collect();

    if words.is_empty() {
        item.trim().to_string()
    } else {
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_sets_max_price_and_is_stripped() {
        let d = decompose("Samsung phone under 20000");
        assert_eq!(d.max_price, Some(20000.0));
        assert_eq!(d.min_price, None);
        assert_eq!(d.primary_query, "Samsung phone");
        assert_eq!(d.brand.as_deref(), Some("samsung"));
        assert_eq!(d.product_type.as_deref(), Some("phone"));
        assert_eq!(d.variations, vec!["Samsung phone", "phone", "samsung"]);
    }

    #[test]
    fn max_phrase_variants() {
        assert_eq!(decompose("laptop below Rs. 45,000").max_price, Some(45000.0));
        assert_eq!(decompose("laptop less than 60k").max_price, Some(60000.0));
        assert_eq!(decompose("earbuds up to ₹3000").max_price, Some(3000.0));
    }

    #[test]
    fn min_phrase_sets_min_price() {
        let d = decompose("gaming laptop above 80000");
        assert_eq!(d.min_price, Some(80000.0));
        assert_eq!(d.primary_query, "gaming laptop");
        let d = decompose("tv over 30k");
        assert_eq!(d.min_price, Some(30000.0));
    }

    #[test]
    fn small_numbers_are_not_prices() {
        let d = decompose("phone under 2 years warranty");
        assert_eq!(d.max_price, None);
        assert_eq!(d.primary_query, "phone under 2 years warranty");
        assert_eq!(decompose("laptop above 8 gb ram").min_price, None);
        assert_eq!(decompose("earbuds under 2k").max_price, Some(2000.0));
        assert_eq!(decompose("cable under 150").max_price, Some(150.0));
    }

    #[test]
    fn between_sets_both_bounds() {
        let d = decompose("headphone between 2000 and 5000");
        assert_eq!(d.min_price, Some(2000.0));
        assert_eq!(d.max_price, Some(5000.0));
        assert_eq!(d.primary_query, "headphone");
    }

    #[test]
    fn brand_uses_word_boundary() {
        assert_eq!(decompose("wireless mouse").brand, None);
        assert_eq!(decompose("Sony WH-1000XM5 headphone").brand.as_deref(), Some("sony"));
        assert_eq!(decompose("mipad").brand, None);
    }

    #[test]
    fn brand_and_type_variations() {
        let d = decompose("dell inspiron laptop");
        assert_eq!(
            d.variations,
            vec!["dell inspiron laptop", "dell laptop", "laptop", "dell"]
        );
    }

    #[test]
    fn multi_word_type_skips_brand_alone() {
        let d = decompose("lg front load washing machine");
        assert_eq!(d.product_type.as_deref(), Some("washing machine"));
        assert_eq!(
            d.variations,
            vec!["lg front load washing machine", "lg washing machine", "washing machine"]
        );
    }

    #[test]
    fn plain_query_has_single_variation() {
        let d = decompose("Samsung Galaxy S24");
        assert_eq!(d.brand.as_deref(), Some("samsung"));
        assert_eq!(d.product_type, None);
        assert_eq!(d.variations, vec!["Samsung Galaxy S24"]);
    }

    #[test]
    fn price_only_query_keeps_original_text() {
        let d = decompose("under 5000");
        assert_eq!(d.max_price, Some(5000.0));
        assert_eq!(d.primary_query, "under 5000");
    }

    #[test]
    fn simplify_strips_codes_and_dimensions() {
        assert_eq!(
            simplify_product_query("Vitrified Tiles (600x600) GVT-60X60-BR 1200"),
            "Vitrified Tiles"
        );
        assert_eq!(
            simplify_product_query("LED Panel Light [18W] 12x12 - Cool White"),
            "LED Panel Light 18W Cool White"
        );
    }

    #[test]
    fn simplify_caps_word_count() {
        assert_eq!(
            simplify_product_query("heavy duty stainless steel kitchen sink with drainboard"),
            "heavy duty stainless steel kitchen sink"
        );
    }

    #[test]
    fn simplify_falls_back_to_original() {
        assert_eq!(simplify_product_query("  AB12345 ~~ 600x600 "), "AB12345 ~~ 600x600");
    }
}
