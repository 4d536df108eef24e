//! OpenAI embedding provider.
//!
//! Generates embeddings via the OpenAI Embeddings API
//! (e.g., text-embedding-3-small, text-embedding-3-large). Requires an
//! `OPENAI_API_KEY` environment variable or explicit API key configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::rag::embeddings::EmbeddingFunction;
use crate::rag::types::Embeddings;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

fn default_model_name() -> String {
    "text-embedding-3-small".to_string()
}

/// Configuration for the OpenAI embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIEmbeddingConfig {
    /// OpenAI API key. Falls back to `OPENAI_API_KEY` /
    /// `EMBEDDINGS_OPENAI_API_KEY` environment variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name to use for embeddings.
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Base URL for API requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Embedding dimensions override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
}

impl Default for OpenAIEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: default_model_name(),
            api_base: None,
            dimensions: None,
            timeout: None,
        }
    }
}

/// OpenAI embedding provider.
///
/// Implements [`EmbeddingFunction`] by calling `POST {api_base}/embeddings`.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    /// Provider configuration.
    pub config: OpenAIEmbeddingConfig,
}

impl OpenAIEmbedding {
    /// Create a provider with default configuration.
    pub fn new() -> Self {
        Self {
            config: OpenAIEmbeddingConfig::default(),
        }
    }

    /// Create a provider with the given configuration.
    pub fn with_config(config: OpenAIEmbeddingConfig) -> Self {
        Self { config }
    }

    /// Create a provider from a `rag_model` identifier.
    ///
    /// `"openai"` selects the default model; `"openai/<model>"` selects
    /// `<model>` explicitly.
    pub fn for_rag_model(rag_model: &str) -> Self {
        let mut config = OpenAIEmbeddingConfig::default();
        if let Some(model) = rag_model.strip_prefix("openai/") {
            if !model.is_empty() {
                config.model_name = model.to_string();
            }
        }
        Self { config }
    }

    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .or_else(|| std::env::var("EMBEDDINGS_OPENAI_API_KEY").ok())
    }

    fn api_base_url(&self) -> String {
        self.config
            .api_base
            .clone()
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }
}

impl Default for OpenAIEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingFunction for OpenAIEmbedding {
    fn model_name(&self) -> &str {
        &self.config.model_name
    }

    async fn embed(&self, input: &[String]) -> Result<Embeddings, anyhow::Error> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self.resolve_api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "OpenAI API key not found. Set OPENAI_API_KEY or configure api_key."
            )
        })?;

        let mut body = json!({
            "model": self.config.model_name,
            "input": input,
        });
        if let Some(dimensions) = self.config.dimensions {
            body["dimensions"] = json!(dimensions);
        }

        let timeout_secs = self.config.timeout.unwrap_or(60.0);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs_f64(timeout_secs))
            .build()?;

        let endpoint = format!("{}/embeddings", self.api_base_url());
        log::debug!(
            "OpenAI embed (model={}): {} inputs",
            self.config.model_name,
            input.len()
        );

        let response = client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "OpenAI embeddings API error ({}): {}",
                status,
                &response_text[..response_text.len().min(500)]
            ));
        }

        let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
            anyhow::anyhow!(
                "Failed to parse OpenAI embeddings response: {} - Body: {}",
                e,
                &response_text[..response_text.len().min(500)]
            )
        })?;

        let data = response_json["data"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("OpenAI embeddings response missing 'data' array"))?;

        // Results are paired with inputs by position, so honor the `index` field.
        let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
        for item in data {
            let index = item["index"].as_u64().unwrap_or(indexed.len() as u64) as usize;
            let embedding = item["embedding"]
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("OpenAI embeddings item missing 'embedding'"))?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();
            indexed.push((index, embedding));
        }
        indexed.sort_by_key(|(index, _)| *index);

        Ok(indexed.into_iter().map(|(_, embedding)| embedding).collect())
    }
}
