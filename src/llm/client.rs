//! HTTP client for the extraction model collaborator.
//!
//! Supports Ollama for local inference and OpenAI-compatible endpoints.
//! The client returns the model's raw response text; repair and decoding
//! live in [`super::repair`] and [`super::decode`] so that every transport
//! feeds the same tolerant parsing path. For OpenAI-compatible providers
//! the raw chat envelope is returned as-is and the decoder unwraps
//! `choices[0].message.content` itself.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{LlmConfig, LlmProvider};

/// Seam between the orchestrator and the extraction model transport.
#[async_trait]
pub trait ReceiptExtractor: Send + Sync {
    /// Submit concatenated receipt text and return the raw model response.
    async fn extract(&self, receipts_text: &str) -> Result<String, LlmError>;
}

/// LLM client for receipt extraction.
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

/// OpenAI-compatible chat request format.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl LlmClient {
    /// Create a new LLM client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // 5 min timeout for slow models
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Get the config.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is available.
    pub async fn is_available(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        match self.config.provider {
            LlmProvider::Ollama => {
                let url = format!("{}/api/tags", self.config.endpoint);
                match self.client.get(&url).send().await {
                    Ok(resp) => resp.status().is_success(),
                    Err(_) => false,
                }
            }
            LlmProvider::OpenAI => {
                let url = format!("{}/v1/models", self.config.endpoint);
                match self.request(self.client.get(&url)).await {
                    Ok(resp) => resp.status().is_success(),
                    Err(_) => false,
                }
            }
        }
    }

    /// List models the configured endpoint can serve.
    pub async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        match self.config.provider {
            LlmProvider::Ollama => {
                let url = format!("{}/api/tags", self.config.endpoint);
                let resp = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| LlmError::Connection(e.to_string()))?;

                if !resp.status().is_success() {
                    return Err(LlmError::Api(format!("HTTP {}", resp.status())));
                }

                #[derive(Deserialize)]
                struct TagsResponse {
                    models: Vec<ModelInfo>,
                }

                #[derive(Deserialize)]
                struct ModelInfo {
                    name: String,
                }

                let tags: TagsResponse = resp
                    .json()
                    .await
                    .map_err(|e| LlmError::Parse(e.to_string()))?;

                Ok(tags.models.into_iter().map(|m| m.name).collect())
            }
            LlmProvider::OpenAI => {
                let url = format!("{}/v1/models", self.config.endpoint);
                let resp = self.request(self.client.get(&url)).await?;

                if !resp.status().is_success() {
                    return Err(LlmError::Api(format!("HTTP {}", resp.status())));
                }

                #[derive(Deserialize)]
                struct ModelsResponse {
                    data: Vec<ModelEntry>,
                }

                #[derive(Deserialize)]
                struct ModelEntry {
                    id: String,
                }

                let models: ModelsResponse = resp
                    .json()
                    .await
                    .map_err(|e| LlmError::Parse(e.to_string()))?;

                Ok(models.data.into_iter().map(|m| m.id).collect())
            }
        }
    }

    /// Build the extraction prompt for a run's concatenated receipt text.
    fn build_prompt(&self, receipts_text: &str) -> String {
        let truncated = self.truncate_receipts(receipts_text);
        self.config
            .get_extraction_prompt()
            .replace("{receipts}", truncated)
    }

    /// Truncate receipt text to the configured maximum (UTF-8 safe).
    fn truncate_receipts<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_receipt_chars {
            return text;
        }
        // Find a valid UTF-8 boundary at or before max_receipt_chars
        let mut end = self.config.max_receipt_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Send a request, attaching the API key when one is configured.
    async fn request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, LlmError> {
        let builder = match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        };
        builder
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))
    }

    /// Call the Ollama generate API with a prompt.
    async fn call_ollama(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }

    /// Call an OpenAI-compatible chat completions API, returning the raw
    /// envelope body.
    async fn call_openai(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.endpoint);
        let resp = self.request(self.client.post(&url).json(&request)).await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        resp.text()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ReceiptExtractor for LlmClient {
    async fn extract(&self, receipts_text: &str) -> Result<String, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let prompt = self.build_prompt(receipts_text);
        debug!(
            chars = prompt.len(),
            model = %self.config.model,
            "requesting receipt extraction"
        );

        match self.config.provider {
            LlmProvider::Ollama => self.call_ollama(&prompt).await,
            LlmProvider::OpenAI => self.call_openai(&prompt).await,
        }
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug)]
pub enum LlmError {
    /// Failed to connect to LLM service
    Connection(String),
    /// API returned an error
    Api(String),
    /// Failed to parse response
    Parse(String),
    /// LLM is disabled
    Disabled,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            LlmError::Api(msg) => write!(f, "API error: {}", msg),
            LlmError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LlmError::Disabled => write!(f, "LLM is disabled"),
        }
    }
}

impl std::error::Error for LlmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_substitutes_receipt_text() {
        let client = LlmClient::new(LlmConfig::default()).unwrap();
        let prompt = client.build_prompt("KROGER 530\nMILK 4.49");
        assert!(prompt.contains("KROGER 530"));
        assert!(!prompt.contains("{receipts}"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let config = LlmConfig {
            max_receipt_chars: 5,
            ..LlmConfig::default()
        };
        let client = LlmClient::new(config).unwrap();
        // "café" is 5 bytes; cutting at 5 lands on a boundary, 4 does not.
        assert_eq!(client.truncate_receipts("caféx"), "café");

        let config = LlmConfig {
            max_receipt_chars: 4,
            ..LlmConfig::default()
        };
        let client = LlmClient::new(config).unwrap();
        assert_eq!(client.truncate_receipts("caféx"), "caf");
    }

    #[tokio::test]
    async fn disabled_client_refuses_extraction() {
        let config = LlmConfig {
            enabled: false,
            ..LlmConfig::default()
        };
        let client = LlmClient::new(config).unwrap();
        assert!(matches!(
            client.extract("anything").await,
            Err(LlmError::Disabled)
        ));
        assert!(!client.is_available().await);
    }
}
