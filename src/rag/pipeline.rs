//! Complete RAG pipeline: Load -> Index -> Retrieve -> Prompt -> Generate

use std::path::Path;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use crate::config::AppConfig;
use crate::corpus::Corpus;
use crate::embeddings::EmbeddingClient;
use crate::embeddings::Encoder;
use crate::embeddings::FlatL2Factory;
use crate::embeddings::IndexBuilder;
use crate::embeddings::IndexFactory;
use crate::errors::Result;
use crate::llm::GenerationClient;
use crate::llm::LlmClient;
use crate::llm::TextGenerator;
use crate::rag::assemble_prompt;
use crate::rag::AnswerRecord;
use crate::rag::RetrievalResult;
use crate::rag::Retriever;
use crate::rag::Tier;
use crate::rag::Timings;

/// Initialization counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitStats {
    /// Corpus load attempts
    pub corpus_loads: usize,
    /// Index build attempts
    pub index_builds: usize,
}

/// Complete RAG service
///
/// Initialization succeeds at most once and is shared by every caller;
/// after that all state is read-only.
pub struct RagService {
    corpus_path: std::path::PathBuf,
    top_k: usize,
    encoder: Option<Arc<dyn Encoder>>,
    factory: Arc<dyn IndexFactory>,
    generation: GenerationClient,
    ready: OnceCell<Retriever>,
    corpus_loads: AtomicUsize,
    index_builds: AtomicUsize,
}

impl RagService {
    /// Create a service from explicit capabilities
    ///
    /// Nothing is loaded until [`initialize`](Self::initialize) or the first
    /// answer.
    #[must_use]
    pub fn new(
        config: &AppConfig,
        encoder: Option<Arc<dyn Encoder>>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        Self {
            corpus_path: config.corpus_path().to_path_buf(),
            top_k: config.top_k(),
            encoder,
            factory: Arc::new(FlatL2Factory),
            generation: GenerationClient::new(
                generator,
                Duration::from_secs(config.llm.timeout_secs),
            ),
            ready: OnceCell::new(),
            corpus_loads: AtomicUsize::new(0),
            index_builds: AtomicUsize::new(0),
        }
    }

    /// Create a service with the backends the configuration enables
    ///
    /// # Errors
    /// - HTTP client build errors for a configured backend
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let encoder =
            EmbeddingClient::from_app_config(config)?.map(|c| Arc::new(c) as Arc<dyn Encoder>);
        let generator =
            LlmClient::from_app_config(config)?.map(|c| Arc::new(c) as Arc<dyn TextGenerator>);

        info!(
            "RAG service configured: embeddings {}, generation {}",
            if encoder.is_some() { "enabled" } else { "disabled" },
            if generator.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self::new(config, encoder, generator))
    }

    /// Replace the index technology used by the vector tier
    #[must_use]
    pub fn with_index_factory(mut self, factory: Arc<dyn IndexFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Load the corpus and select the retrieval tier
    ///
    /// Idempotent: concurrent callers wait for a single initialization. A
    /// failed attempt leaves the service uninitialized.
    ///
    /// # Errors
    /// - `CorpusNotFound` when the knowledge base file is missing
    pub async fn initialize(&self) -> Result<()> {
        self.retriever().await.map(|_| ())
    }

    async fn retriever(&self) -> Result<&Retriever> {
        self.ready.get_or_try_init(|| self.load()).await
    }

    async fn load(&self) -> Result<Retriever> {
        let started = Instant::now();
        info!("Initializing RAG pipeline from {}", self.corpus_path.display());

        self.corpus_loads.fetch_add(1, Ordering::SeqCst);
        let corpus = Corpus::load(&self.corpus_path)?;

        self.index_builds.fetch_add(1, Ordering::SeqCst);
        let tier = IndexBuilder::new(self.encoder.clone(), Arc::clone(&self.factory))
            .build(&corpus)
            .await;

        info!(
            "RAG pipeline ready: {} chunks, {} search, in {:?}",
            corpus.len(),
            tier.kind(),
            started.elapsed()
        );
        Ok(Retriever::new(corpus, tier))
    }

    /// Answer `query` with the configured retrieval breadth
    ///
    /// # Errors
    /// - `CorpusNotFound` when initialization cannot load the knowledge base;
    ///   every other failure is folded into the returned record
    pub async fn answer(&self, query: &str) -> Result<AnswerRecord> {
        self.answer_with_k(query, self.top_k).await
    }

    /// Answer `query` from the top `k` chunks
    pub async fn answer_with_k(&self, query: &str, k: usize) -> Result<AnswerRecord> {
        let started = Instant::now();
        let retriever = self.retriever().await?;

        info!("Processing RAG query: {}", query);

        // Step 1: Retrieve relevant chunks
        let retrieval_started = Instant::now();
        let retrieval = retriever.retrieve(query, k).await;
        let retrieval_ms = millis(retrieval_started.elapsed());
        debug!("Retrieved {} chunks via {} search", retrieval.chunks.len(), retrieval.tier);

        // Step 2: Assemble prompt
        let prompt = assemble_prompt(query, &retrieval.chunks);

        // Step 3: Generate answer
        let generation_started = Instant::now();
        let generation = self.generation.generate(&prompt).await;
        let generation_ms = millis(generation_started.elapsed());

        let timings = Timings {
            retrieval_ms,
            generation_ms,
            total_ms: millis(started.elapsed()),
        };
        debug!(
            "RAG timings: retrieval {}ms, generation {}ms, total {}ms",
            timings.retrieval_ms, timings.generation_ms, timings.total_ms
        );

        Ok(AnswerRecord {
            query: query.to_string(),
            tier_used: retrieval.tier,
            context_chunks: retrieval.chunks,
            answer_text: generation.text,
            generation: generation.outcome,
            timings,
        })
    }

    /// Retrieve the top `k` chunks for `query` without generation
    pub async fn search(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let retriever = self.retriever().await?;
        Ok(retriever.retrieve(query, k).await)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    /// Tier selected at initialization, once ready
    #[must_use]
    pub fn tier(&self) -> Option<Tier> {
        self.ready.get().map(Retriever::tier)
    }

    /// Number of loaded chunks, once ready
    #[must_use]
    pub fn chunk_count(&self) -> Option<usize> {
        self.ready.get().map(|r| r.corpus().len())
    }

    #[must_use]
    pub fn init_stats(&self) -> InitStats {
        InitStats {
            corpus_loads: self.corpus_loads.load(Ordering::SeqCst),
            index_builds: self.index_builds.load(Ordering::SeqCst),
        }
    }

    #[must_use]
    pub fn corpus_path(&self) -> &Path {
        &self.corpus_path
    }

    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Name of the generation backend, if one is configured
    #[must_use]
    pub fn generation_backend(&self) -> Option<&str> {
        self.generation.backend_name()
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::KbragError;

    fn config_for(path: &Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.corpus.path = path.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_lazy_until_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.txt");
        std::fs::write(&path, "Cats are mammals.\n\nDogs are loyal.").unwrap();

        let service = RagService::new(&config_for(&path), None, None);
        assert!(!service.is_ready());
        assert_eq!(service.tier(), None);
        assert_eq!(service.init_stats(), InitStats::default());

        service.initialize().await.unwrap();
        assert!(service.is_ready());
        assert_eq!(service.tier(), Some(Tier::Lexical));
        assert_eq!(service.chunk_count(), Some(2));
    }

    #[tokio::test]
    async fn test_missing_corpus_does_not_poison() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.txt");
        let service = RagService::new(&config_for(&path), None, None);

        let err = service.answer("anything").await.unwrap_err();
        assert!(matches!(err, KbragError::CorpusNotFound(_)));
        assert!(err.is_fatal());
        assert!(!service.is_ready());

        std::fs::write(&path, "Now it exists.").unwrap();
        service.initialize().await.unwrap();
        assert_eq!(service.chunk_count(), Some(1));
        assert_eq!(service.init_stats().corpus_loads, 2);
        assert_eq!(service.init_stats().index_builds, 1);
    }

    #[tokio::test]
    async fn test_search_skips_generation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.txt");
        std::fs::write(&path, "Rust is fast.\n\nPython is dynamic.").unwrap();

        let service = RagService::new(&config_for(&path), None, None);
        let result = service.search("rust", 5).await.unwrap();
        assert_eq!(result.tier, Tier::Lexical);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].text, "Rust is fast.");
    }

    #[test]
    fn test_millis_saturates() {
        assert_eq!(millis(Duration::from_millis(42)), 42);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
