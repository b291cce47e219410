//! Product insight backend: an LLM when configured, keyword rules otherwise.

pub mod client;
pub mod error;
pub mod rules;
pub mod types;

pub use client::{AiBackend, AiConfig};
pub use error::AiError;
pub use rules::detect_product_by_rules;
pub use types::ProductInsight;
