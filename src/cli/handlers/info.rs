//! Information display handlers

use crate::cli::output::print_config;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::rag::RagService;
use crate::AppConfig;
use crate::Result;

pub async fn handle_info(service: &RagService, config: &AppConfig) -> Result<()> {
    print_config(config);
    println!();

    service.initialize().await?;
    let chunks = service.chunk_count().unwrap_or_default();
    print_success(&format!(
        "Knowledge base loaded: {} chunks from {}",
        chunks,
        service.corpus_path().display()
    ));
    if chunks == 0 {
        print_warning("Knowledge base is empty; every answer will lack context");
    }

    if let Some(tier) = service.tier() {
        println!("  Retrieval tier: {tier}");
    }
    match service.generation_backend() {
        Some(name) => println!("  Generation backend: {name}"),
        None if config.llm_enabled() => print_warning(&format!(
            "Generation provider {} has no API key; answers are built from context",
            config.llm.provider
        )),
        None => print_warning("Generation disabled; answers are built from context"),
    }
    Ok(())
}
