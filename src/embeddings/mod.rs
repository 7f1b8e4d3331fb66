//! Embeddings and vector index module
//!
//! This module provides the optional vector tier of the pipeline:
//! - [`Encoder`] capability, implemented over HTTP by [`EmbeddingClient`]
//!   (OpenAI or Ollama)
//! - [`VectorIndex`] / [`IndexFactory`] capability, implemented by the exact
//!   [`FlatL2Index`]
//! - [`IndexBuilder`], which encodes the whole corpus once and yields the
//!   [`RetrievalTier`] used for the process lifetime
//!
//! # Examples
//!
//! ```rust,no_run
//! use kbrag::config::AppConfig;
//! use kbrag::embeddings::EmbeddingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     if let Some(client) = EmbeddingClient::from_app_config(&config)? {
//!         let vectors = client.generate_batch(vec!["Hello, world!"]).await?;
//!         println!("Generated embedding with {} dimensions", vectors[0].len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod index;

pub use builder::IndexBuilder;
pub use builder::RetrievalTier;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use client::Encoder;
pub use index::FlatL2Factory;
pub use index::FlatL2Index;
pub use index::IndexFactory;
pub use index::VectorIndex;

use tracing::warn;

/// Maximum batch size for embedding generation
pub const MAX_BATCH_SIZE: usize = 100;

/// Resolved configuration for an embedding backend
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    /// Probe the application config for an usable embedding backend
    ///
    /// Returns `None` when the capability is absent: provider disabled, or
    /// OpenAI selected without a key in config or `OPENAI_API_KEY`.
    pub fn from_app_config(config: &crate::config::AppConfig) -> Option<Self> {
        let provider = match config.embeddings.provider.as_str() {
            "openai" => EmbeddingProvider::OpenAI,
            "ollama" => EmbeddingProvider::Ollama,
            _ => return None,
        };

        let api_key = config
            .embeddings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());

        if provider == EmbeddingProvider::OpenAI && api_key.is_none() {
            warn!("OpenAI embeddings selected but no API key found; vector search disabled");
            return None;
        }

        Some(Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: if provider == EmbeddingProvider::OpenAI {
                api_key
            } else {
                None
            },
            timeout_secs: config.embeddings.timeout_secs,
        })
    }
}
