use crate::error::PriceScoutError;

/// Longest accepted query, in bytes.
pub const MAX_QUERY_LENGTH: usize = 200;
/// Shortest accepted query, in characters, after sanitization.
pub const MIN_QUERY_CHARS: usize = 2;
/// Upper bound for `max_results`.
pub const MAX_RESULTS_LIMIT: usize = 200;
/// Longest accepted bulk item name, in bytes.
pub const MAX_ITEM_LENGTH: usize = 300;

/// Strip control characters and trim. Rejects input that is too long or
/// empty afterwards.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, PriceScoutError> {
    if input.len() > max_len {
        return Err(PriceScoutError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if sanitized.is_empty() {
        return Err(PriceScoutError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a search query: at most 200 bytes, at least 2 characters once
/// control characters and surrounding whitespace are gone.
pub fn validate_query(input: &str) -> Result<String, PriceScoutError> {
    let query = sanitize_text(input, MAX_QUERY_LENGTH)?;
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(PriceScoutError::InvalidInput(format!(
            "query must be at least {} characters",
            MIN_QUERY_CHARS
        )));
    }
    Ok(query)
}

/// Validate max_results (must be 1..=200).
pub fn validate_max_results(max_results: usize) -> Result<usize, PriceScoutError> {
    if !(1..=MAX_RESULTS_LIMIT).contains(&max_results) {
        return Err(PriceScoutError::InvalidInput(format!(
            "max_results must be between 1 and {}",
            MAX_RESULTS_LIMIT
        )));
    }
    Ok(max_results)
}

/// Validate one bulk row: a non-empty item name and a finite, non-negative
/// rate and quantity.
pub fn validate_bulk_row(item: &str, rate: f64, qty: f64) -> Result<String, PriceScoutError> {
    let item = sanitize_text(item, MAX_ITEM_LENGTH)?;
    if !rate.is_finite() || rate < 0.0 {
        return Err(PriceScoutError::InvalidInput(format!(
            "rate for '{}' must be a non-negative number",
            item
        )));
    }
    if !qty.is_finite() || qty < 0.0 {
        return Err(PriceScoutError::InvalidInput(format!(
            "quantity for '{}' must be a non-negative number",
            item
        )));
    }
    Ok(item)
}
