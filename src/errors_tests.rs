//! Unit tests for error handling
//!
//! Tests error types, conversions, and error message formatting.

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::PathBuf;

    use crate::errors::KbragError;

    // ====== Error Type Tests ======

    #[test]
    fn test_custom_error() {
        let error = KbragError::Custom("Test error message".to_string());
        assert_eq!(format!("{error}"), "Test error message");
    }

    #[test]
    fn test_corpus_not_found_mentions_path() {
        let error = KbragError::CorpusNotFound(PathBuf::from("/srv/kb/knowledge_base.txt"));
        let display = format!("{error}");
        assert!(display.contains("Knowledge base not found"));
        assert!(display.contains("/srv/kb/knowledge_base.txt"));
    }

    #[test]
    fn test_only_missing_corpus_is_fatal() {
        assert!(KbragError::CorpusNotFound(PathBuf::from("kb.txt")).is_fatal());
        assert!(!KbragError::LlmError("quota".to_string()).is_fatal());
        assert!(!KbragError::EmbeddingError("down".to_string()).is_fatal());
        assert!(!KbragError::ConfigError("bad".to_string()).is_fatal());
    }

    #[test]
    fn test_config_error() {
        let error = KbragError::ConfigError("Invalid configuration".to_string());
        assert!(matches!(error, KbragError::ConfigError(_)));
        assert!(format!("{error}").contains("configuration"));
    }

    // ====== Error Conversion Tests ======

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: KbragError = io_err.into();
        assert!(matches!(err, KbragError::Io(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("not = = toml").unwrap_err();
        let err: KbragError = toml_err.into();
        assert!(matches!(err, KbragError::TomlParsing(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: KbragError = json_err.into();
        assert!(matches!(err, KbragError::Serialization(_)));
    }
}
