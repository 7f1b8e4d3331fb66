//! Retrieval over the loaded corpus: vector tier with a lexical fallback

use std::collections::HashSet;

use tracing::debug;
use tracing::warn;

use crate::corpus::Chunk;
use crate::corpus::Corpus;
use crate::embeddings::RetrievalTier;
use crate::errors::KbragError;
use crate::errors::Result;
use crate::rag::RetrievalResult;
use crate::rag::Tier;

/// Retriever over an immutable corpus and the tier chosen for it
#[derive(Debug)]
pub struct Retriever {
    corpus: Corpus,
    tier: RetrievalTier,
}

impl Retriever {
    /// Create a new retriever
    #[must_use]
    pub fn new(corpus: Corpus, tier: RetrievalTier) -> Self {
        Self { corpus, tier }
    }

    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Tier selected at initialization
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier.kind()
    }

    /// Top-`k` chunks for `query`, most relevant first
    ///
    /// Returns at most `min(k, corpus size)` chunks. The vector tier encodes
    /// every query, blank ones included; the lexical tier matches nothing for
    /// a blank query. A query that cannot be served by the vector tier is
    /// answered lexically instead.
    pub async fn retrieve(&self, query: &str, k: usize) -> RetrievalResult {
        if k == 0 || self.corpus.is_empty() {
            return RetrievalResult {
                tier: self.tier(),
                chunks: Vec::new(),
            };
        }

        if let RetrievalTier::Vector { .. } = &self.tier {
            match self.semantic_search(query, k).await {
                Ok(chunks) => {
                    return RetrievalResult {
                        tier: Tier::Vector,
                        chunks,
                    }
                }
                Err(e) => warn!("Vector search failed, answering with keyword search: {e}"),
            }
        }

        RetrievalResult {
            tier: Tier::Lexical,
            chunks: self.keyword_search(query, k),
        }
    }

    /// Semantic search using the vector index
    async fn semantic_search(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        let RetrievalTier::Vector { encoder, index } = &self.tier else {
            return Err(KbragError::IndexError("No vector index built".to_string()));
        };

        debug!("Performing semantic search: {}", query);
        let query_vector = encoder
            .encode(&[query])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KbragError::EmbeddingError("No embedding for query".to_string()))?;

        if query_vector.len() != index.dimension() {
            return Err(KbragError::EmbeddingError(format!(
                "Query embedding has {} dimensions, index has {}",
                query_vector.len(),
                index.dimension()
            )));
        }

        let ordinals = index.search(&query_vector, k);
        let chunks: Vec<Chunk> = ordinals
            .iter()
            .filter_map(|&ordinal| {
                let chunk = self.corpus.get(ordinal);
                if chunk.is_none() {
                    debug!("Dropping out-of-range ordinal {ordinal} from index");
                }
                chunk.cloned()
            })
            .take(k)
            .collect();

        debug!("Semantic search returned {} chunks", chunks.len());
        Ok(chunks)
    }

    /// Keyword search over the raw chunks
    fn keyword_search(&self, query: &str, k: usize) -> Vec<Chunk> {
        debug!("Performing keyword search: {}", query);
        lexical_search(self.corpus.chunks(), query, k)
            .into_iter()
            .cloned()
            .collect()
    }
}

/// Score chunks by shared lower-cased words with `query`
///
/// A chunk is a candidate when it shares at least one word with the query
/// or contains any query word as a substring. Candidates are ordered by
/// descending overlap, ties in corpus order, and cut to `k`.
#[must_use]
pub fn lexical_search<'a>(chunks: &'a [Chunk], query: &str, k: usize) -> Vec<&'a Chunk> {
    let query_lower = query.to_lowercase();
    let query_words: HashSet<&str> = query_lower.split_whitespace().collect();
    if query_words.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(&Chunk, usize)> = chunks
        .iter()
        .filter_map(|chunk| {
            let chunk_lower = chunk.text.to_lowercase();
            let chunk_words: HashSet<&str> = chunk_lower.split_whitespace().collect();

            let overlap = chunk_words.iter().filter(|w| query_words.contains(*w)).count();
            if overlap > 0 || query_words.iter().any(|w| chunk_lower.contains(w)) {
                Some((chunk, overlap))
            } else {
                None
            }
        })
        .collect();

    // sort_by is stable, so equal scores keep corpus order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(k);
    scored.into_iter().map(|(chunk, _)| chunk).collect()
}
