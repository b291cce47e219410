//! Error types for the product insight backend.

use thiserror::Error;

/// Errors from a chat completion round trip.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Rate limited by LLM endpoint (HTTP 429)")]
    RateLimited,
    #[error("LLM request rejected: {0}")]
    InvalidRequest(String),
    #[error("LLM response had no message content")]
    EmptyResponse,
    #[error("Failed to parse LLM response: {0}")]
    ParseFailed(String),
    #[error("Network error")]
    Network(#[from] reqwest::Error),
}
