pub mod client;
pub mod gate;
pub mod gemini;
pub mod prompt;
pub mod proxy;
#[cfg(feature = "network")]
pub mod server;

use serde::{Deserialize, Serialize};

use crate::snippet::{Difficulty, Language, Snippet, SnippetId};

/// Topic used when the user leaves the field blank.
pub const DEFAULT_TOPIC: &str = "syntax";

/// Body of a generation request, as sent to the proxy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub language: Language,
    pub topic: String,
}

impl GenerationRequest {
    pub fn new(language: Language, topic: &str) -> Self {
        Self {
            language,
            topic: normalize_topic(topic),
        }
    }
}

pub fn normalize_topic(topic: &str) -> String {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Why a generation attempt produced no snippet. `Display` is the text shown
/// to the user.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
        retry_after: Option<String>,
    },
    #[error("Model returned empty code. Try another topic.")]
    EmptyCode,
    #[error("Failed to generate snippet (HTTP {status}): {excerpt}")]
    Malformed { status: u16, excerpt: String },
    #[error("Failed to generate snippet: {0}")]
    Transport(String),
}

impl GenerationError {
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            GenerationError::Rejected { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }

    /// User-facing message including the retry hint, when there is one.
    pub fn display_message(&self) -> String {
        match self.retry_after() {
            Some(hint) => format!("{self} (retry after {hint}s)"),
            None => self.to_string(),
        }
    }
}

/// Something that turns a (language, topic) pair into snippet code.
/// Implementations block; callers run them off the event loop.
pub trait SnippetGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Wrap generated code into a snippet ready for the store.
pub fn generated_snippet(id: SnippetId, request: &GenerationRequest, code: String) -> Snippet {
    Snippet::new(
        id,
        format!("Gemini: {}", request.topic),
        request.language,
        Difficulty::Medium,
        code,
    )
}

/// First `max_chars` chars of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_topic_falls_back() {
        assert_eq!(normalize_topic(""), "syntax");
        assert_eq!(normalize_topic("   "), "syntax");
        assert_eq!(normalize_topic(" generics "), "generics");
    }

    #[test]
    fn test_request_serializes_lowercase_language() {
        let req = GenerationRequest::new(Language::TypeScript, "");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["language"], "typescript");
        assert_eq!(json["topic"], "syntax");
    }

    #[test]
    fn test_generated_snippet_shape() {
        let req = GenerationRequest::new(Language::Python, "loops");
        let snippet = generated_snippet(SnippetId::new("gen-1-5"), &req, "for x in y:\n    pass".into());
        assert_eq!(snippet.title(), "Gemini: loops");
        assert_eq!(snippet.language(), Language::Python);
        assert_eq!(snippet.difficulty(), Difficulty::Medium);
        assert_eq!(snippet.code(), "for x in y:\n    pass");
    }

    #[test]
    fn test_retry_hint_in_display_message() {
        let err = GenerationError::Rejected {
            status: 429,
            message: "Quota exceeded".into(),
            retry_after: Some("30".into()),
        };
        assert_eq!(err.display_message(), "Quota exceeded (retry after 30s)");
        assert_eq!(
            GenerationError::EmptyCode.display_message(),
            "Model returned empty code. Try another topic."
        );
    }

    #[test]
    fn test_truncate_chars_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
