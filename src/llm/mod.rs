//! Text generation backends and the degrading generation client
//!
//! - [`TextGenerator`] capability, implemented over HTTP by [`LlmClient`]
//!   (Gemini, OpenAI-compatible or Ollama)
//! - [`GenerationClient`], which never fails: backend errors and a missing
//!   backend both produce an answer built from the prompt's context

pub mod client;
pub mod generation;

use async_trait::async_trait;
pub use client::LlmClient;
pub use generation::Generation;
pub use generation::GenerationClient;
pub use generation::GenerationError;
pub use generation::GenerationOutcome;
pub use generation::DEGRADED_CONTEXT_MAX_CHARS;
use tracing::warn;

use crate::errors::Result;

/// Prompt-to-completion capability
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend identifier, for logs
    fn name(&self) -> &str;

    /// Completion for `prompt`
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Supported generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// Google Gemini `generateContent` API
    Gemini,
    /// Any OpenAI-compatible chat completions API
    OpenAI,
    /// Ollama local generation
    Ollama,
}

impl LlmProvider {
    /// Environment variable consulted when the config carries no key
    #[must_use]
    pub const fn key_env(self) -> Option<&'static str> {
        match self {
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Ollama => None,
        }
    }
}

/// Resolved configuration for a generation backend
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl LlmConfig {
    /// Probe the application config for an usable generation backend
    ///
    /// Returns `None` when the provider is disabled, or when a hosted
    /// provider has no key in config or in its environment variable.
    pub fn from_app_config(config: &crate::config::AppConfig) -> Option<Self> {
        let provider = match config.llm.provider.as_str() {
            "gemini" => LlmProvider::Gemini,
            "openai" => LlmProvider::OpenAI,
            "ollama" => LlmProvider::Ollama,
            _ => return None,
        };

        let api_key = match provider.key_env() {
            Some(env) => {
                let key = Some(config.llm_key().to_string())
                    .filter(|k| !k.is_empty())
                    .or_else(|| std::env::var(env).ok().filter(|k| !k.is_empty()));
                if key.is_none() {
                    warn!(
                        "{provider:?} generation selected but no API key found \
                         (set llm_key or {env})"
                    );
                    return None;
                }
                key
            }
            None => None,
        };

        Some(Self {
            provider,
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            api_key,
            model: config.llm_model().to_string(),
            timeout_secs: config.llm.timeout_secs,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_disabled_provider_has_no_capability() {
        let mut config = AppConfig::default();
        config.llm.provider = "disabled".to_string();
        assert!(LlmConfig::from_app_config(&config).is_none());
    }

    #[test]
    fn test_gemini_with_configured_key() {
        let mut config = AppConfig::default();
        config.llm.llm_key = "g-test".to_string();
        config.llm.llm_endpoint = "https://example.test/v1beta/".to_string();

        let resolved = LlmConfig::from_app_config(&config).unwrap();
        assert_eq!(resolved.provider, LlmProvider::Gemini);
        assert_eq!(resolved.api_key.as_deref(), Some("g-test"));
        assert_eq!(resolved.endpoint, "https://example.test/v1beta");
        assert_eq!(resolved.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let mut config = AppConfig::default();
        config.llm.provider = "ollama".to_string();
        config.llm.llm_endpoint = "http://localhost:11434".to_string();
        config.llm.llm_model = "llama3".to_string();

        let resolved = LlmConfig::from_app_config(&config).unwrap();
        assert_eq!(resolved.provider, LlmProvider::Ollama);
        assert!(resolved.api_key.is_none());
    }

    #[test]
    fn test_key_env_names() {
        assert_eq!(LlmProvider::Gemini.key_env(), Some("GEMINI_API_KEY"));
        assert_eq!(LlmProvider::OpenAI.key_env(), Some("OPENAI_API_KEY"));
        assert_eq!(LlmProvider::Ollama.key_env(), None);
    }
}
