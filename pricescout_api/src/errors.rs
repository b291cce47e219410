//! Error types for the listing feed client.

/// Errors that can occur when fetching listings from a source.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable response).
    #[error("Request failed")]
    RequestFailed,
    /// The source returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
}

impl Error {
    /// Whether retrying the same request has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RequestFailed => true,
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
        }
    }
}
