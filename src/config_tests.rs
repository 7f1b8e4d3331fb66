//! Unit tests for configuration module
//!
//! These tests validate configuration parsing, defaults, and validation.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::config::*;
    use crate::errors::KbragError;

    // ====== Default Value Tests ======

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.corpus_path(), std::path::Path::new("knowledge_base.txt"));
        assert_eq!(config.top_k(), 3);
        assert!(!config.embeddings_enabled());
        assert!(config.llm_enabled());
        assert_eq!(config.llm_model(), "gemini-2.5-flash");
        assert_eq!(config.llm.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_embedding_settings() {
        assert_eq!(default_dimension(), 384);
        assert_eq!(default_embedding_model(), "all-minilm");
        assert_eq!(default_embedding_endpoint(), "http://localhost:11434");
    }

    // ====== Parsing Tests ======

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.top_k(), 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::from_toml_str(
            r#"
[corpus]
path = "/data/kb.txt"

[llm]
provider = "disabled"

[retrieval]
top_k = 5
"#,
        )
        .unwrap();

        assert_eq!(config.corpus_path(), std::path::Path::new("/data/kb.txt"));
        assert!(!config.llm_enabled());
        assert_eq!(config.top_k(), 5);
        assert_eq!(config.llm_model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_full_embeddings_section() {
        let config = AppConfig::from_toml_str(
            r#"
[embeddings]
provider = "openai"
model = "text-embedding-3-small"
endpoint = "https://api.openai.com/v1"
api_key = "sk-test"
dimension = 1536
"#,
        )
        .unwrap();

        assert!(config.embeddings_enabled());
        assert_eq!(config.embedding_dimension(), 1536);
        assert_eq!(config.embedding_model(), "text-embedding-3-small");
        assert_eq!(config.embeddings.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]\ntop_k = 7").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.top_k(), 7);
    }

    #[test]
    fn test_from_missing_file() {
        let result = AppConfig::from_file("/definitely/not/here/config.toml");
        assert!(matches!(result, Err(KbragError::Io(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = AppConfig::from_toml_str("[retrieval\ntop_k = ");
        assert!(matches!(result, Err(KbragError::TomlParsing(_))));
    }

    // ====== Validation Tests ======

    #[test]
    fn test_zero_top_k_rejected() {
        let result = AppConfig::from_toml_str("[retrieval]\ntop_k = 0");
        assert!(matches!(result, Err(KbragError::ConfigError(_))));
    }

    #[test]
    fn test_unknown_providers_rejected() {
        let result = AppConfig::from_toml_str("[embeddings]\nprovider = \"faiss\"");
        assert!(matches!(result, Err(KbragError::ConfigError(_))));

        let result = AppConfig::from_toml_str("[llm]\nprovider = \"palm\"");
        assert!(matches!(result, Err(KbragError::ConfigError(_))));
    }

    #[test]
    fn test_zero_dimension_rejected_only_when_enabled() {
        let disabled = AppConfig::from_toml_str("[embeddings]\ndimension = 0");
        assert!(disabled.is_ok());

        let enabled =
            AppConfig::from_toml_str("[embeddings]\nprovider = \"ollama\"\ndimension = 0");
        assert!(matches!(enabled, Err(KbragError::ConfigError(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = AppConfig::from_toml_str("[llm]\ntimeout_secs = 0");
        assert!(matches!(result, Err(KbragError::ConfigError(_))));
    }
}
