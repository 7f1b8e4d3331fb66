//! HTTP clients for generation providers

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use serde_json::Value;
use tracing::debug;
use tracing::info;

use super::LlmConfig;
use super::LlmProvider;
use super::TextGenerator;
use crate::errors::KbragError;
use crate::errors::Result;

/// Client for one configured generation provider
pub struct LlmClient {
    config: LlmConfig,
    client: Client,
}

impl LlmClient {
    /// Create a new generation client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| KbragError::HttpError(e.to_string()))?;

        info!(
            "Generation client ready: {:?} model {} at {}",
            config.provider, config.model, config.endpoint
        );

        Ok(Self { config, client })
    }

    /// Build a client when the application config enables one
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Option<Self>> {
        LlmConfig::from_app_config(config).map(Self::new).transpose()
    }

    fn api_key(&self) -> Result<&str> {
        self.config.api_key.as_deref().ok_or_else(|| {
            KbragError::ConfigError(format!("{:?} API key not provided", self.config.provider))
        })
    }

    async fn post_json(&self, request: reqwest::RequestBuilder, body: &Value) -> Result<Value> {
        let response = request
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| KbragError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(KbragError::LlmError(format!(
                "{:?} API error ({status}): {error_text}",
                self.config.provider
            )));
        }

        response
            .json()
            .await
            .map_err(|e| KbragError::LlmError(format!("Failed to parse response: {e}")))
    }

    /// Generate using the Gemini `generateContent` API
    async fn complete_gemini(&self, prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct GeminiResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<Content>,
        }

        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }

        #[derive(Deserialize)]
        struct Part {
            #[serde(default)]
            text: String,
        }

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        );
        debug!("Calling Gemini API: {}", url);

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
            },
        });

        let request = self.client.post(&url).query(&[("key", self.api_key()?)]);
        let value = self.post_json(request, &body).await?;
        let response: GeminiResponse = serde_json::from_value(value)?;

        Ok(response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }

    /// Generate using an OpenAI-compatible chat completions API
    async fn complete_openai(&self, prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct ChatResponse {
            #[serde(default)]
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }

        #[derive(Deserialize)]
        struct Message {
            #[serde(default)]
            content: Option<String>,
        }

        let url = format!("{}/chat/completions", self.config.endpoint);
        debug!("Calling chat completions API: {}", url);

        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()?));
        let value = self.post_json(request, &body).await?;
        let response: ChatResponse = serde_json::from_value(value)?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Generate using the Ollama API
    async fn complete_ollama(&self, prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct OllamaResponse {
            #[serde(default)]
            response: String,
        }

        let url = format!("{}/api/generate", self.config.endpoint);
        debug!("Calling Ollama generate API: {}", url);

        let body = json!({
            "model": self.config.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens,
            },
        });

        let value = self.post_json(self.client.post(&url), &body).await?;
        let response: OllamaResponse = serde_json::from_value(value)?;
        Ok(response.response)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.config.provider {
            LlmProvider::Gemini => self.complete_gemini(prompt).await,
            LlmProvider::OpenAI => self.complete_openai(prompt).await,
            LlmProvider::Ollama => self.complete_ollama(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: LlmProvider, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            provider,
            // Nothing listens on the discard port
            endpoint: "http://127.0.0.1:9".to_string(),
            api_key: api_key.map(str::to_string),
            model: "test-model".to_string(),
            timeout_secs: 2,
            temperature: 0.7,
            max_tokens: 64,
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let client = LlmClient::new(config(LlmProvider::OpenAI, None)).unwrap();
        assert!(matches!(client.api_key(), Err(KbragError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_errors() {
        let client = LlmClient::new(config(LlmProvider::Ollama, None)).unwrap();
        assert!(client.complete("hello").await.is_err());
    }

    #[test]
    fn test_name_is_model() {
        let client = LlmClient::new(config(LlmProvider::Gemini, Some("k"))).unwrap();
        assert_eq!(client.name(), "test-model");
    }
}
