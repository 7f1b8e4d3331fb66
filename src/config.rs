use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::KbragError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

pub(crate) fn default_corpus_path() -> PathBuf {
    PathBuf::from("knowledge_base.txt")
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub backtrace: bool,
}

pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            backtrace: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// `disabled`, `ollama` or `openai`
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

pub(crate) fn default_disabled() -> String {
    "disabled".to_string()
}

pub(crate) fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

pub(crate) fn default_embedding_endpoint() -> String {
    "http://localhost:11434".to_string()
}

pub(crate) fn default_dimension() -> usize {
    384
}

pub(crate) fn default_embedding_timeout() -> u64 {
    60
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: default_embedding_model(),
            endpoint: default_embedding_endpoint(),
            api_key: None,
            dimension: default_dimension(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `disabled`, `gemini`, `openai` or `ollama`
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

pub(crate) fn default_llm_provider() -> String {
    "gemini".to_string()
}

pub(crate) fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

pub(crate) fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

pub(crate) fn default_llm_timeout() -> u64 {
    30
}

pub(crate) fn default_temperature() -> f32 {
    0.7
}

pub(crate) fn default_max_tokens() -> usize {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            llm_endpoint: default_llm_endpoint(),
            llm_key: String::new(),
            llm_model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

pub(crate) fn default_top_k() -> usize {
    crate::rag::DEFAULT_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

const EMBEDDING_PROVIDERS: [&str; 3] = ["disabled", "ollama", "openai"];
const LLM_PROVIDERS: [&str; 4] = ["disabled", "gemini", "openai", "ollama"];

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(KbragError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(KbragError::ConfigError(
                "retrieval.top_k must be >= 1".to_string(),
            ));
        }

        if !EMBEDDING_PROVIDERS.contains(&self.embeddings.provider.as_str()) {
            return Err(KbragError::ConfigError(format!(
                "Unknown embedding provider '{}'. Must be one of: {}",
                self.embeddings.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embeddings_enabled() && self.embeddings.dimension == 0 {
            return Err(KbragError::ConfigError(format!(
                "embeddings.dimension must be > 0 when provider is '{}'",
                self.embeddings.provider
            )));
        }

        if !LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(KbragError::ConfigError(format!(
                "Unknown LLM provider '{}'. Must be one of: {}",
                self.llm.provider,
                LLM_PROVIDERS.join(", ")
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(KbragError::ConfigError(
                "llm.timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get knowledge corpus path
    pub fn corpus_path(&self) -> &Path {
        &self.corpus.path
    }

    /// Check if an embedding provider is configured
    pub fn embeddings_enabled(&self) -> bool {
        self.embeddings.provider != "disabled"
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Check if a generation backend is configured
    pub fn llm_enabled(&self) -> bool {
        self.llm.provider != "disabled"
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM key
    pub fn llm_key(&self) -> &str {
        &self.llm.llm_key
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }

    /// Get default retrieval breadth
    pub fn top_k(&self) -> usize {
        self.retrieval.top_k
    }
}
