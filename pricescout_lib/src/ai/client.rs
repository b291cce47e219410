//! LLM-backed product detection over an OpenAI-compatible chat endpoint.

use std::time::Duration;

use super::error::AiError;
use super::rules::detect_product_by_rules;
use super::types::{ChatMessage, ChatRequest, ChatResponse, ProductInsight};

/// Request timeout for chat completion calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a product analysis assistant. Analyze shopping queries and \
extract product information. Return ONLY a raw JSON object, no markdown and no code blocks. \
Only identify real, purchasable products.";

/// Connection settings for the chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl AiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

/// Whether an LLM is available for product detection. Chosen once at startup.
#[derive(Debug, Clone, PartialEq)]
pub enum AiBackend {
    Available(AiConfig),
    Unavailable,
}

impl AiBackend {
    /// Reads `PRICESCOUT_LLM_KEY`, `PRICESCOUT_LLM_URL` and
    /// `PRICESCOUT_LLM_MODEL`. No key means [`AiBackend::Unavailable`].
    pub fn from_env() -> Self {
        let key = std::env::var("PRICESCOUT_LLM_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let Some(key) = key else {
            tracing::info!("PRICESCOUT_LLM_KEY not set, using rule-based product detection");
            return Self::Unavailable;
        };
        let mut config = AiConfig::new(key.trim());
        if let Ok(url) = std::env::var("PRICESCOUT_LLM_URL") {
            config = config.with_base_url(&url);
        }
        if let Ok(model) = std::env::var("PRICESCOUT_LLM_MODEL") {
            config = config.with_model(&model);
        }
        Self::Available(config)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Label recorded with each search.
    pub fn model_name(&self) -> &str {
        match self {
            Self::Available(config) => &config.model,
            Self::Unavailable => "rules",
        }
    }

    /// Detects what `query` asks for. Never fails: any LLM error is logged
    /// and the rule-based detector answers instead.
    pub async fn detect_product(&self, query: &str) -> ProductInsight {
        match self {
            Self::Unavailable => detect_product_by_rules(query),
            Self::Available(config) => match complete(config, query).await {
                Ok(insight) => insight,
                Err(e) => {
                    tracing::error!("AI product detection failed: {}", e);
                    detect_product_by_rules(query)
                }
            },
        }
    }
}

fn user_prompt(query: &str) -> String {
    format!(
        r#"Analyze this search query and extract product information: "{}"

Return a JSON object with exactly this structure:
{{
    "is_searchable": true or false (false if the product does not exist or is not sold),
    "product_name": "main product name",
    "products": ["variation 1", "variation 2", "variation 3"],
    "brands": ["brand1", "brand2", "brand3"],
    "price_range_min": minimum typical price in INR,
    "price_range_max": maximum typical price in INR,
    "category": "Electronics/Fashion/Home/Construction/Food/etc"
}}"#,
        query
    )
}

/// Removes a surrounding Markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = match trimmed.find('\n') {
        Some(i) => &trimmed[i + 1..],
        None => return "",
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

async fn complete(config: &AiConfig, query: &str) -> Result<ProductInsight, AiError> {
    let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let request = ChatRequest {
        model: &config.model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: user_prompt(query),
            },
        ],
        temperature: 0.2,
    };

    let response = http
        .post(format!("{}/chat/completions", config.base_url))
        .bearer_auth(&config.api_key)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AiError::RateLimited);
    } else if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        let snippet: String = body.chars().take(200).collect();
        return Err(AiError::InvalidRequest(format!("HTTP {}: {}", status, snippet)));
    }

    let chat: ChatResponse = response
        .json()
        .await
        .map_err(|e| AiError::ParseFailed(format!("Failed to deserialize response: {}", e)))?;
    let content = chat
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(AiError::EmptyResponse)?;

    serde_json::from_str(strip_code_fences(&content))
        .map_err(|e| AiError::ParseFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_removed() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```"), "");
    }

    #[test]
    fn config_builders() {
        let cfg = AiConfig::new("k")
            .with_base_url("http://localhost:9000/v1/")
            .with_model("small");
        assert_eq!(cfg.base_url, "http://localhost:9000/v1");
        assert_eq!(cfg.model, "small");
    }

    #[tokio::test]
    async fn unavailable_uses_rules() {
        let insight = AiBackend::Unavailable.detect_product("bluetooth headphone").await;
        assert_eq!(insight.category, "Headphone");
        assert_eq!(AiBackend::Unavailable.model_name(), "rules");
    }
}
