//! RAG (Retrieval-Augmented Generation) handlers

use crate::cli::output::print_answer;
use crate::cli::output::print_info;
use crate::cli::output::print_search_results;
use crate::rag::RagService;
use crate::Result;

pub async fn handle_ask(
    service: &RagService,
    question: &str,
    k: Option<usize>,
    json: bool,
) -> Result<()> {
    let k = k.unwrap_or_else(|| service.top_k());
    if !json {
        print_info(&format!("🤖 RAG Query: \"{question}\""));
    }

    let record = service.answer_with_k(question, k).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_answer(&record);
    }
    Ok(())
}

pub async fn handle_search(service: &RagService, query: &str, k: Option<usize>) -> Result<()> {
    let k = k.unwrap_or_else(|| service.top_k());
    let result = service.search(query, k).await?;
    print_search_results(query, &result);
    Ok(())
}
