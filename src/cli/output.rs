//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `kbrag` CLI

use crate::corpus::Chunk;
use crate::rag::AnswerRecord;
use crate::rag::RetrievalResult;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// Returns the truncated string with a "..." suffix if truncated, otherwise
/// the original string.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Print an answer record
pub fn print_answer(record: &AnswerRecord) {
    println!("\n💬 Answer:\n");
    println!("{}", record.answer_text);
    println!();
    println!(
        "📚 Sources ({} chunks via {} search, generation: {:?}):",
        record.context_chunks.len(),
        record.tier_used,
        record.generation
    );
    print_chunks(&record.context_chunks, 120);
    println!(
        "⏱️  retrieval {}ms | generation {}ms | total {}ms",
        record.timings.retrieval_ms, record.timings.generation_ms, record.timings.total_ms
    );
}

/// Print retrieval results
pub fn print_search_results(query: &str, result: &RetrievalResult) {
    println!("🔍 Results for \"{query}\" ({} search):", result.tier);
    if result.chunks.is_empty() {
        println!("  No matching chunks");
        return;
    }
    print_chunks(&result.chunks, 200);
}

fn print_chunks(chunks: &[Chunk], max_chars: usize) {
    for (idx, chunk) in chunks.iter().enumerate() {
        println!(
            "  {}. [#{}] {}",
            idx + 1,
            chunk.ordinal,
            truncate_str(&chunk.text, max_chars)
        );
    }
}

/// Print the configuration relevant to answering
pub fn print_config(config: &AppConfig) {
    println!("📋 Configuration:");
    println!("  Corpus: {}", config.corpus_path().display());
    println!("  Top K: {}", config.top_k());
    println!("  Embeddings:");
    println!("    Provider: {}", config.embeddings.provider);
    println!("    Model: {}", config.embedding_model());
    println!("    Endpoint: {}", config.embeddings.endpoint);
    println!("    Dimension: {}", config.embedding_dimension());
    println!("  LLM:");
    println!("    Provider: {}", config.llm.provider);
    println!("    Model: {}", config.llm_model());
    println!("    Endpoint: {}", config.llm_endpoint());
    println!("    Key: {}", mask_key(config.llm_key()));
}

fn mask_key(key: &str) -> String {
    if key.is_empty() {
        "(not set)".to_string()
    } else if key.chars().count() > 8 {
        let prefix: String = key.chars().take(4).collect();
        format!("{prefix}***")
    } else {
        "***".to_string()
    }
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 5), "hello...");
        assert_eq!(truncate_str("🦀🦀🦀", 2), "🦀🦀...");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(""), "(not set)");
        assert_eq!(mask_key("short"), "***");
        assert_eq!(mask_key("sk-1234567890"), "sk-1***");
    }
}
