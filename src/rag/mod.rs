//! RAG (Retrieval-Augmented Generation) module
//!
//! This module answers questions against a plain-text knowledge base:
//! - Retrieval through the vector tier, or keyword overlap when no
//!   embedding backend is available
//! - Prompt assembly from the retrieved chunks
//! - Answer generation that degrades to a context excerpt instead of failing
//!
//! # Examples
//!
//! ```rust,no_run
//! use kbrag::config::AppConfig;
//! use kbrag::rag::RagService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = RagService::from_config(&config)?;
//!
//!     let record = service.answer("What are the opening hours?").await?;
//!     println!("Answer: {}", record.answer_text);
//!     println!("Sources: {} chunks via {}", record.context_chunks.len(), record.tier_used);
//!
//!     Ok(())
//! }
//! ```

pub mod pipeline;
pub mod prompts;
pub mod retriever;

use std::fmt;

pub use pipeline::InitStats;
pub use pipeline::RagService;
pub use prompts::assemble_prompt;
pub use prompts::extract_context;
pub use retriever::lexical_search;
pub use retriever::Retriever;
use serde::Serialize;

use crate::corpus::Chunk;
use crate::llm::GenerationOutcome;

/// Number of chunks retrieved per answer unless configured otherwise
pub const DEFAULT_TOP_K: usize = 3;

/// Retrieval tier that served a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Nearest-neighbour search over embeddings
    Vector,
    /// Word-overlap keyword search
    Lexical,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Lexical => write!(f, "lexical"),
        }
    }
}

/// Chunks returned for one query, most relevant first
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub tier: Tier,
    pub chunks: Vec<Chunk>,
}

/// Per-stage latency of one answer, in milliseconds
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Timings {
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub total_ms: u64,
}

/// Result of one pipeline invocation
///
/// Owned by the caller, which decides whether to persist it.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub query: String,
    pub tier_used: Tier,
    pub context_chunks: Vec<Chunk>,
    pub answer_text: String,
    pub generation: GenerationOutcome,
    pub timings: Timings,
}
