//! Embedding API clients for various providers

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::StreamExt;
use futures::stream::{self};
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::KbragError;
use crate::errors::Result;

/// Concurrent requests issued against providers without a batch endpoint
const OLLAMA_CONCURRENCY: usize = 16;

/// Text-to-vector capability used to build and query the vector index
///
/// The same encoder must be used for the corpus and for queries.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Model identifier, for logs
    fn model_name(&self) -> &str;

    /// Encode `texts` into one vector per input, in input order
    async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;
}

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

/// Client for generating embeddings from various providers
pub struct EmbeddingClient {
    config: EmbeddingConfig,
    client: Client,
}

impl EmbeddingClient {
    /// Create a new embedding client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KbragError::HttpError(e.to_string()))?;

        info!(
            "Embedding client ready: {:?} model {} ({} dims)",
            config.provider, config.model, config.dimension
        );

        Ok(Self { config, client })
    }

    /// Build a client when the application config enables one
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Option<Self>> {
        EmbeddingConfig::from_app_config(config)
            .map(Self::new)
            .transpose()
    }

    /// Generate embeddings for multiple texts in batch
    pub async fn generate_batch(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let normalized: Vec<String> = texts.iter().map(|t| normalize_whitespace(t)).collect();
        let mut embeddings = Vec::with_capacity(normalized.len());

        for batch in normalized.chunks(MAX_BATCH_SIZE) {
            let batch: Vec<&str> = batch.iter().map(String::as_str).collect();
            let vectors = match self.config.provider {
                EmbeddingProvider::OpenAI => self.generate_batch_openai(batch).await?,
                EmbeddingProvider::Ollama => {
                    // Ollama doesn't support batch, so fan out with bounded concurrency
                    let owned: Vec<String> = batch.iter().map(|t| (*t).to_string()).collect();
                    let results: Vec<Result<Vec<f32>>> = stream::iter(owned)
                        .map(|text| async move { self.generate_ollama(&text).await })
                        .buffered(OLLAMA_CONCURRENCY)
                        .collect()
                        .await;
                    results.into_iter().collect::<Result<Vec<_>>>()?
                }
            };
            embeddings.extend(vectors);
        }

        self.check_batch(texts.len(), &embeddings)?;
        Ok(embeddings)
    }

    /// One vector per input, each of the configured dimension
    fn check_batch(&self, expected: usize, embeddings: &[Vec<f32>]) -> Result<()> {
        if embeddings.len() != expected {
            return Err(KbragError::EmbeddingError(format!(
                "Expected {expected} embeddings, got {}",
                embeddings.len()
            )));
        }
        embeddings.iter().try_for_each(|e| self.check_dimension(e))
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() == self.config.dimension {
            Ok(())
        } else {
            Err(KbragError::EmbeddingError(format!(
                "Model {} returned {} dimensions, expected {}",
                self.config.model,
                embedding.len(),
                self.config.dimension
            )))
        }
    }

    /// Generate embeddings in batch using `OpenAI` API
    async fn generate_batch_openai(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| KbragError::ConfigError("OpenAI API key not provided".to_string()))?;

        #[derive(Serialize)]
        struct OpenAIBatchRequest<'a> {
            input: Vec<&'a str>,
            model: &'a str,
        }

        let url = format!("{}/embeddings", self.config.endpoint);
        debug!("Calling OpenAI batch embeddings API: {} items", texts.len());

        let request = OpenAIBatchRequest {
            input: texts,
            model: &self.config.model,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| KbragError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KbragError::EmbeddingError(format!(
                "OpenAI API error ({status}): {error_text}"
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| KbragError::EmbeddingError(format!("Failed to parse response: {e}")))?;

        Ok(result.into_ordered())
    }

    /// Generate embedding using Ollama API
    async fn generate_ollama(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.config.endpoint);
        debug!("Calling Ollama embeddings API: {}", url);

        let request = OllamaRequest {
            model: &self.config.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| KbragError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KbragError::EmbeddingError(format!(
                "Ollama API error ({status}): {error_text}"
            )));
        }

        let result: OllamaResponse = response
            .json()
            .await
            .map_err(|e| KbragError::EmbeddingError(format!("Failed to parse response: {e}")))?;

        Ok(result.embedding)
    }
}

#[async_trait]
impl Encoder for EmbeddingClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.generate_batch(texts.to_vec()).await
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIResponse {
    /// Embeddings in input order; the API may return them shuffled
    fn into_ordered(mut self) -> Vec<Vec<f32>> {
        self.data.sort_by_key(|d| d.index);
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

/// Collapse newlines and runs of whitespace into single spaces
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: EmbeddingProvider::Ollama,
            model: "all-minilm".to_string(),
            dimension: 384,
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a\nb\r\n\tc   d"), "a b c d");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_dimension_check() {
        let client = EmbeddingClient::new(ollama_config()).unwrap();
        assert!(client.check_dimension(&vec![0.0; 384]).is_ok());
        assert!(matches!(
            client.check_dimension(&[0.0, 1.0]),
            Err(KbragError::EmbeddingError(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let client = EmbeddingClient::new(ollama_config()).unwrap();
        let vectors = client.generate_batch(Vec::new()).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[test]
    fn test_openai_response_restores_input_order() {
        let body = r#"{
            "data": [
                {"index": 2, "embedding": [2.0, 2.0]},
                {"index": 0, "embedding": [0.0, 0.0]},
                {"index": 1, "embedding": [1.0, 1.0]}
            ],
            "model": "text-embedding-3-small"
        }"#;
        let response: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.into_ordered(),
            vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 2.0]]
        );
    }

    #[test]
    fn test_batch_check() {
        let mut config = ollama_config();
        config.dimension = 2;
        let client = EmbeddingClient::new(config).unwrap();

        assert!(client.check_batch(2, &[vec![0.0, 1.0], vec![1.0, 0.0]]).is_ok());
        // Count mismatch
        assert!(matches!(
            client.check_batch(3, &[vec![0.0, 1.0]]),
            Err(KbragError::EmbeddingError(_))
        ));
        // One vector of the wrong dimension
        assert!(matches!(
            client.check_batch(2, &[vec![0.0, 1.0], vec![1.0]]),
            Err(KbragError::EmbeddingError(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_ollama_fails_batch() {
        let mut config = ollama_config();
        // Nothing listens on the discard port
        config.endpoint = "http://127.0.0.1:9".to_string();
        config.timeout_secs = 2;
        let client = EmbeddingClient::new(config).unwrap();

        let result = client.encode(&["first", "second"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "Requires a running Ollama instance"]
    async fn test_ollama_embedding() {
        let client = EmbeddingClient::new(ollama_config()).unwrap();
        let embeddings = client
            .generate_batch(vec!["Hello, world!", "Goodbye"])
            .await
            .unwrap();
        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == 384));
    }
}
