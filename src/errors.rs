use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbragError {
    #[error("Knowledge base not found at {}", .0.display())]
    CorpusNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Vector index error: {0}")]
    IndexError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl KbragError {
    /// Whether the error is fatal for the pipeline (no corpus to answer from)
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::CorpusNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, KbragError>;
