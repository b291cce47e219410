//! Price extraction from noisy text fragments.
//!
//! Scraped snippets carry ratings, review counts, model years and crossed-out
//! MRPs next to the real price. Every pattern below is tried, implausible
//! values are dropped, and the median of what survives is returned.

use std::sync::OnceLock;

use regex::Regex;

/// Lowest value accepted as a price.
pub const MIN_PLAUSIBLE_PRICE: f64 = 500.0;
/// Highest value accepted as a price.
pub const MAX_PLAUSIBLE_PRICE: f64 = 10_000_000.0;
/// Values in this band read as calendar years and are never prices.
pub const YEAR_BAND: (f64, f64) = (2019.0, 2030.0);

const NUMBER: &str = r"([0-9][0-9,]*(?:\.[0-9]{1,2})?)";

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // ₹1,234
            format!(r"₹\s*{}", NUMBER),
            // Rs. 1,234 / INR 1234
            format!(r"(?i)\b(?:rs\.?|inr)\s*{}", NUMBER),
            // Price: 1,234
            format!(r"(?i)\bprice\s*:?\s*(?:₹|rs\.?|inr)?\s*{}", NUMBER),
            // 1,234 rupees / 1234/- Rs
            format!(r"(?i){}\s*(?:/-\s*)?(?:rupees|rs|inr)\b", NUMBER),
            // $1,234.50
            format!(r"\$\s*{}", NUMBER),
        ]
        .iter()
        .map(|p| Regex::new(p).expect("price pattern is a valid regex"))
        .collect()
    })
}

fn in_year_band(value: f64) -> bool {
    (YEAR_BAND.0..=YEAR_BAND.1).contains(&value)
}

/// `raw * scale` when it lands in the plausibility band. The year band is
/// checked against the number as written, before scaling.
fn plausible_amount(raw: f64, scale: f64) -> Option<f64> {
    if !raw.is_finite() || in_year_band(raw) {
        return None;
    }
    let scaled = raw * scale;
    (MIN_PLAUSIBLE_PRICE..=MAX_PLAUSIBLE_PRICE)
        .contains(&scaled)
        .then_some(scaled)
}

/// Whether `price` falls inside the plausibility band and outside the year band.
pub fn is_plausible_price(price: f64) -> bool {
    plausible_amount(price, 1.0).is_some()
}

/// All plausible prices found in `text`, sorted ascending.
///
/// A number matched by several patterns (for example "Price: Rs. 999" hits
/// both the `Rs.` and the `Price:` pattern) is counted once.
pub fn price_candidates(text: &str) -> Vec<f64> {
    price_candidates_scaled(text, 1.0)
}

/// Like [`price_candidates`], with every number multiplied by `scale` before
/// the plausibility check. Used to read foreign-currency text in INR terms.
pub fn price_candidates_scaled(text: &str, scale: f64) -> Vec<f64> {
    let mut seen_offsets: Vec<usize> = Vec::new();
    let mut values = Vec::new();

    for re in patterns() {
        for cap in re.captures_iter(text) {
            let Some(m) = cap.get(1) else {
                continue;
            };
            if seen_offsets.contains(&m.start()) {
                continue;
            }
            seen_offsets.push(m.start());
            let cleaned = m.as_str().replace(',', "");
            let Ok(raw) = cleaned.parse::<f64>() else {
                continue;
            };
            if let Some(value) = plausible_amount(raw, scale) {
                values.push(value);
            }
        }
    }

    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Returns the most plausible price in `text`, or `None` when nothing passes.
pub fn extract_price(text: &str) -> Option<f64> {
    extract_price_scaled(text, 1.0)
}

/// The median of [`price_candidates_scaled`].
pub fn extract_price_scaled(text: &str, scale: f64) -> Option<f64> {
    let values = price_candidates_scaled(text, scale);
    match values.len() {
        0 => None,
        1 => Some(values[0]),
        n => Some(values[n / 2]),
    }
}

/// A bare amount such as `"74999"` or `"1,299.50"`, as sent by structured
/// feeds, scaled like [`extract_price_scaled`]. Only the whole trimmed text
/// is considered.
pub fn parse_bare_amount(text: &str, scale: f64) -> Option<f64> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    cleaned.parse::<f64>().ok().and_then(|raw| plausible_amount(raw, scale))
}

/// Returns the most plausible price in `text`, or `0.0` when none is found.
pub fn parse_price(text: &str) -> f64 {
    extract_price(text).unwrap_or(0.0)
}

/// The currency symbol written in `text`, if any.
pub fn detect_currency_symbol(text: &str) -> Option<&'static str> {
    if text.contains('₹') {
        return Some("₹");
    }
    static RUPEE_WORD: OnceLock<Regex> = OnceLock::new();
    let rupee_word = RUPEE_WORD.get_or_init(|| {
        Regex::new(r"(?i)\b(?:rs|inr|rupees?)\b").expect("rupee word is a valid regex")
    });
    if rupee_word.is_match(text) {
        return Some("₹");
    }
    if text.contains('$') {
        return Some("$");
    }
    if text.contains('£') {
        return Some("£");
    }
    if text.contains('€') {
        return Some("€");
    }
    None
}
