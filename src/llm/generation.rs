//! Generation with context-derived fallback answers

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use super::TextGenerator;
use crate::rag::extract_context;

/// Longest context excerpt, in characters, used for a degraded answer
pub const DEGRADED_CONTEXT_MAX_CHARS: usize = 500;

const UNCONFIGURED_MESSAGE: &str = "AI service not configured.";

const APOLOGY_MESSAGE: &str = "I apologize, \
but I encountered an error while generating a response. \
Please check that the generation backend is configured correctly.";

/// Why a completion could not be produced
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("No generation backend configured")]
    Unconfigured,

    #[error("Generation call failed: {0}")]
    CallFailed(String),

    #[error("Generation timed out after {0:?}")]
    TimedOut(Duration),
}

/// How an answer was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationOutcome {
    /// Backend completion returned verbatim
    Generated,
    /// No backend available
    Unconfigured,
    /// Backend failed; answer built from the context
    Degraded,
}

/// Answer text plus how it was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub outcome: GenerationOutcome,
}

/// Generation client that always produces an answer
#[derive(Clone)]
pub struct GenerationClient {
    backend: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl GenerationClient {
    #[must_use]
    pub fn new(backend: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    #[must_use]
    pub fn unconfigured() -> Self {
        Self::new(None, Duration::from_secs(crate::config::default_llm_timeout()))
    }

    /// Name of the configured backend, if any
    #[must_use]
    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.name())
    }

    /// Completion for `prompt`, with the failure kind when there is none
    ///
    /// # Errors
    /// - `Unconfigured` when no backend is available
    /// - `CallFailed` when the backend errors or returns an empty completion
    /// - `TimedOut` when the backend exceeds the configured timeout
    pub async fn try_generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let backend = self.backend.as_ref().ok_or(GenerationError::Unconfigured)?;

        debug!("Generating with {} ({} prompt chars)", backend.name(), prompt.len());
        let text = tokio::time::timeout(self.timeout, backend.complete(prompt))
            .await
            .map_err(|_| GenerationError::TimedOut(self.timeout))?
            .map_err(|e| GenerationError::CallFailed(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(GenerationError::CallFailed("empty completion".to_string()));
        }
        Ok(text)
    }

    /// Answer for `prompt`; never fails
    ///
    /// Without a usable completion the answer is built from the prompt's
    /// context section.
    pub async fn generate(&self, prompt: &str) -> Generation {
        match self.try_generate(prompt).await {
            Ok(text) => Generation {
                text,
                outcome: GenerationOutcome::Generated,
            },
            Err(GenerationError::Unconfigured) => Generation {
                text: degraded_answer(&GenerationError::Unconfigured, prompt),
                outcome: GenerationOutcome::Unconfigured,
            },
            Err(e) => {
                warn!("Generation failed, answering from context: {e}");
                Generation {
                    text: degraded_answer(&e, prompt),
                    outcome: GenerationOutcome::Degraded,
                }
            }
        }
    }
}

/// Fallback answer for `prompt` after `error`
#[must_use]
pub fn degraded_answer(error: &GenerationError, prompt: &str) -> String {
    let excerpt = extract_context(prompt)
        .map(|c| truncate_chars(c, DEGRADED_CONTEXT_MAX_CHARS))
        .filter(|c| !c.is_empty());

    match (error, excerpt) {
        (GenerationError::Unconfigured, Some(excerpt)) => {
            format!("{UNCONFIGURED_MESSAGE} Based on the knowledge base: {excerpt}")
        }
        (GenerationError::Unconfigured, None) => UNCONFIGURED_MESSAGE.to_string(),
        (_, Some(excerpt)) => format!("Based on available information: {excerpt}..."),
        (_, None) => APOLOGY_MESSAGE.to_string(),
    }
}

/// First `max` characters of `s`, on a char boundary
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
