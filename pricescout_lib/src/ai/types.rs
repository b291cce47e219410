//! Product insight and chat completion wire types.

use serde::{Deserialize, Serialize};

/// What the backend believes a query is asking for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInsight {
    #[serde(default = "default_true")]
    pub is_searchable: bool,
    #[serde(default)]
    pub product_name: String,
    /// Model or variant phrasings worth searching for.
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub price_range_min: Option<f64>,
    #[serde(default)]
    pub price_range_max: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn default_category() -> String {
    "General".to_string()
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let insight: ProductInsight = serde_json::from_str(r#"{"product_name":"Kettle"}"#).unwrap();
        assert!(insight.is_searchable);
        assert_eq!(insight.category, "General");
        assert!(insight.brands.is_empty());
        assert_eq!(insight.price_range_min, None);
    }

    #[test]
    fn full_insight_parses() {
        let json = r#"{
            "is_searchable": false,
            "product_name": "Flux Capacitor",
            "products": [],
            "brands": [],
            "category": "Fiction",
            "price_range_min": 0,
            "price_range_max": 0
        }"#;
        let insight: ProductInsight = serde_json::from_str(json).unwrap();
        assert!(!insight.is_searchable);
        assert_eq!(insight.price_range_max, Some(0.0));
    }
}
