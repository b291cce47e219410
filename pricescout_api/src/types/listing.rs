use serde::{Deserialize, Deserializer, Serialize};

/// One raw fragment returned by a source: a display name, the unparsed price
/// text and the page it came from.
///
/// `source_name` is optional on the wire; feeds that aggregate several shops
/// fill it in, single-shop feeds leave it to the caller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    pub name: String,
    #[serde(alias = "price", deserialize_with = "string_or_number")]
    pub price_text: String,
    #[serde(alias = "url")]
    pub source_url: String,
    #[serde(default)]
    pub source_name: Option<String>,
}

impl RawListing {
    pub fn new(name: &str, price_text: &str, source_url: &str) -> Self {
        Self {
            name: name.to_string(),
            price_text: price_text.to_string(),
            source_url: source_url.to_string(),
            source_name: None,
        }
    }

    pub fn with_source_name(mut self, source_name: &str) -> Self {
        self.source_name = Some(source_name.to_string());
        self
    }
}

/// Some feeds send `"price": 74999` instead of `"price": "₹74,999"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected price string or number, got {}",
            other
        ))),
    }
}
