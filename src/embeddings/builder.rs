//! Corpus-wide embedding and index construction

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;
use tracing::warn;

use super::Encoder;
use super::IndexFactory;
use super::VectorIndex;
use crate::corpus::Corpus;
use crate::errors::KbragError;
use crate::errors::Result;
use crate::rag::Tier;

/// Retrieval strategy selected once at initialization
pub enum RetrievalTier {
    /// Nearest-neighbour search over corpus embeddings
    Vector {
        encoder: Arc<dyn Encoder>,
        index: Box<dyn VectorIndex>,
    },
    /// Word-overlap scoring over raw chunk text
    Lexical,
}

impl RetrievalTier {
    #[must_use]
    pub const fn kind(&self) -> Tier {
        match self {
            Self::Vector { .. } => Tier::Vector,
            Self::Lexical => Tier::Lexical,
        }
    }
}

impl fmt::Debug for RetrievalTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector { encoder, index } => f
                .debug_struct("Vector")
                .field("model", &encoder.model_name())
                .field("vectors", &index.len())
                .field("dimension", &index.dimension())
                .finish(),
            Self::Lexical => f.write_str("Lexical"),
        }
    }
}

/// Encodes every chunk and builds the index, or settles on the lexical tier
pub struct IndexBuilder {
    encoder: Option<Arc<dyn Encoder>>,
    factory: Arc<dyn IndexFactory>,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(encoder: Option<Arc<dyn Encoder>>, factory: Arc<dyn IndexFactory>) -> Self {
        Self { encoder, factory }
    }

    /// Select the retrieval tier for `corpus`
    ///
    /// Never fails: any problem with the embedding backend selects
    /// [`RetrievalTier::Lexical`] for the lifetime of the pipeline.
    pub async fn build(&self, corpus: &Corpus) -> RetrievalTier {
        let Some(encoder) = &self.encoder else {
            info!("No embedding backend configured; using keyword search");
            return RetrievalTier::Lexical;
        };

        if corpus.is_empty() {
            info!("Corpus is empty; nothing to index, using keyword search");
            return RetrievalTier::Lexical;
        }

        match self.build_index(encoder.as_ref(), corpus).await {
            Ok(index) => RetrievalTier::Vector {
                encoder: Arc::clone(encoder),
                index,
            },
            Err(e) => {
                warn!("Vector index build failed, falling back to keyword search: {e}");
                RetrievalTier::Lexical
            }
        }
    }

    async fn build_index(
        &self,
        encoder: &dyn Encoder,
        corpus: &Corpus,
    ) -> Result<Box<dyn VectorIndex>> {
        let started = Instant::now();
        info!(
            "Creating embeddings for {} chunks with {}",
            corpus.len(),
            encoder.model_name()
        );

        let texts: Vec<&str> = corpus.texts().collect();
        let vectors = encoder.encode(&texts).await?;

        // One vector per chunk, matched by ordinal
        if vectors.len() != corpus.len() {
            return Err(KbragError::EmbeddingError(format!(
                "Encoder returned {} vectors for {} chunks",
                vectors.len(),
                corpus.len()
            )));
        }

        let index = self.factory.build(vectors)?;
        info!(
            "Vector index created: {} vectors, {} dims in {:?}",
            index.len(),
            index.dimension(),
            started.elapsed()
        );
        Ok(index)
    }
}
