//! Knowledge corpus loading
//!
//! The corpus is a flat text file whose paragraphs (separated by a blank
//! line) become the retrievable [`Chunk`]s. Chunks are produced once at
//! load time and are read-only afterwards.

use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::errors::KbragError;
use crate::errors::Result;

/// An immutable unit of retrievable text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the corpus sequence
    pub ordinal: usize,
    pub text: String,
}

/// Ordered, read-only sequence of chunks
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

impl Corpus {
    /// Build a corpus from raw text
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let chunks = split_paragraphs(text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Chunk { ordinal, text })
            .collect();

        Self { chunks }
    }

    /// Read and split the knowledge corpus at `path`
    ///
    /// # Errors
    /// - `CorpusNotFound` when the file does not exist
    /// - `Io` for any other read failure (permissions, invalid UTF-8)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => KbragError::CorpusNotFound(path.to_path_buf()),
            _ => KbragError::Io(e),
        })?;
        let corpus = Self::from_text(&content);

        info!(
            "Loaded {} chunks from knowledge base {}",
            corpus.len(),
            path.display()
        );
        Ok(corpus)
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub fn get(&self, ordinal: usize) -> Option<&Chunk> {
        self.chunks.get(ordinal)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk texts in ordinal order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.text.as_str())
    }
}

/// Split text on blank-line boundaries, trimming and dropping empty paragraphs
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<String> {
    // Normalize Windows line endings so "\r\n\r\n" is a paragraph break too
    let normalized = text.replace("\r\n", "\n");
    let paragraphs: Vec<String> = normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    debug!("Split {} bytes into {} paragraphs", text.len(), paragraphs.len());
    paragraphs
}
