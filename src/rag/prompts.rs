//! Prompt assembly for grounded answers

use crate::corpus::Chunk;

/// Marker opening the context section of a prompt
pub const CONTEXT_MARKER: &str = "Context:";

/// Marker closing the context section of a prompt
pub const QUESTION_MARKER: &str = "Question:";

const PREAMBLE: &str = "You are a helpful AI assistant. \
Use the following context to answer the question. \
If the answer is not in the context, say so and provide a general answer.";

/// Build the generation request for `query` over `chunks`
///
/// Chunk texts are joined with a blank line. No truncation happens here;
/// callers bound the prompt size through the number of chunks.
#[must_use]
pub fn assemble_prompt(query: &str, chunks: &[Chunk]) -> String {
    let context = chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{PREAMBLE}\n\n{CONTEXT_MARKER}\n{context}\n\n{QUESTION_MARKER} {query}\n\nAnswer:")
}

/// Context section of a prompt produced by [`assemble_prompt`]
///
/// Returns `None` when the prompt carries no context marker. The section ends
/// at the first question marker after it, or at the end of the prompt if there
/// is none, whatever whitespace precedes the marker.
#[must_use]
pub fn extract_context(prompt: &str) -> Option<&str> {
    let (_, rest) = prompt.split_once(CONTEXT_MARKER)?;
    let section = rest
        .split_once(QUESTION_MARKER)
        .map_or(rest, |(context, _)| context);
    Some(section.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(ordinal: usize, text: &str) -> Chunk {
        Chunk {
            ordinal,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = assemble_prompt(
            "Tell me about dogs",
            &[chunk(0, "Cats are mammals."), chunk(1, "Dogs are loyal.")],
        );

        assert!(prompt.starts_with("You are a helpful AI assistant."));
        assert!(prompt.contains(
            "Context:\nCats are mammals.\n\nDogs are loyal.\n\nQuestion: Tell me about dogs"
        ));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_empty_context_section() {
        let prompt = assemble_prompt("anything", &[]);
        assert!(prompt.contains("Context:\n\n\nQuestion: anything"));
        assert_eq!(extract_context(&prompt), Some(""));
    }

    #[test]
    fn test_extract_round_trips_context() {
        let prompt = assemble_prompt("q", &[chunk(0, "alpha"), chunk(3, "beta")]);
        assert_eq!(extract_context(&prompt), Some("alpha\n\nbeta"));
    }

    #[test]
    fn test_extract_without_marker() {
        assert_eq!(extract_context("just a question"), None);
        assert_eq!(extract_context(""), None);
    }

    #[test]
    fn test_extract_without_question_marker() {
        assert_eq!(extract_context("Context: loose text "), Some("loose text"));
    }

    #[test]
    fn test_extract_inline_question_marker() {
        assert_eq!(extract_context("Context: foo Question: bar"), Some("foo"));
        assert_eq!(extract_context("Context:\nfoo\nQuestion: bar"), Some("foo"));
    }

    #[test]
    fn test_query_is_not_part_of_context() {
        // A query mentioning the marker must not leak into the excerpt
        let prompt = assemble_prompt("what is Context: here?", &[chunk(0, "body")]);
        assert_eq!(extract_context(&prompt), Some("body"));
    }
}
