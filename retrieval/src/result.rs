//! The explanation result contract.

use serde::{Deserialize, Serialize};

use docent_embeddings::EmbeddingError;
use docent_vector_store::VectorStoreError;

use crate::error::RetrievalError;

/// Explanation returned when the documentation does not support an answer.
pub const NOT_DOCUMENTED: &str = "Not documented.";

/// Explanation returned for an empty selection.
pub const NO_SELECTION: &str = "No code selected for explanation.";

/// A documentation section backing an explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub file_path: String,
    pub section_heading: String,
    /// Relevance in `[0, 1]`.
    pub relevance_score: f32,
}

/// Output of the explanation engine.
///
/// For every result produced by enforcement, `has_relevant_docs` is false
/// exactly when the explanation is [`NOT_DOCUMENTED`], the citations are
/// empty and the confidence is zero. Short-circuit and failure results are
/// also uncited with zero confidence but carry their own message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationResult {
    pub explanation: String,
    pub citations: Vec<Citation>,
    pub confidence: f32,
    pub has_relevant_docs: bool,

    /// Set when the result stands in for an internal failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl ExplanationResult {
    /// A grounded explanation.
    pub fn grounded(
        explanation: impl Into<String>,
        citations: Vec<Citation>,
        confidence: f32,
    ) -> Self {
        Self {
            explanation: explanation.into(),
            citations,
            confidence: confidence.clamp(0.0, 1.0),
            has_relevant_docs: true,
            error_kind: None,
        }
    }

    /// The refusal result.
    pub fn not_documented() -> Self {
        Self::uncited(NOT_DOCUMENTED, None)
    }

    /// The result for an empty selection.
    pub fn no_selection() -> Self {
        Self::uncited(NO_SELECTION, None)
    }

    /// The fallback result for an internal failure.
    pub fn failure(kind: FailureKind) -> Self {
        Self::uncited(kind.message(), Some(kind))
    }

    fn uncited(explanation: &str, error_kind: Option<FailureKind>) -> Self {
        Self {
            explanation: explanation.to_string(),
            citations: Vec::new(),
            confidence: 0.0,
            has_relevant_docs: false,
            error_kind,
        }
    }

    /// Whether this is the refusal result.
    pub fn is_not_documented(&self) -> bool {
        self.explanation == NOT_DOCUMENTED
    }

    /// Whether this result stands in for an internal failure.
    pub fn is_failure(&self) -> bool {
        self.error_kind.is_some()
    }
}

/// Class of internal failure, each with its own user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Connection,
    Storage,
    Embedding,
    Timeout,
    ResourceExhausted,
    Unknown,
}

impl FailureKind {
    /// Human-readable message shown instead of an explanation.
    pub fn message(self) -> &'static str {
        match self {
            Self::Connection => {
                "Unable to explain this code: the documentation index could not be reached."
            }
            Self::Storage => {
                "Unable to explain this code: the documentation index could not be read. Try re-indexing the workspace."
            }
            Self::Embedding => {
                "Unable to explain this code: the selection could not be turned into a search query."
            }
            Self::Timeout => "Unable to explain this code: the documentation lookup timed out.",
            Self::ResourceExhausted => {
                "Unable to explain this code: the selection is too large to process."
            }
            Self::Unknown => "Unable to explain this code: an unexpected error occurred.",
        }
    }

    /// Classify an engine error.
    pub fn from_error(error: &RetrievalError) -> Self {
        match error {
            RetrievalError::Store(VectorStoreError::Embedding(e))
            | RetrievalError::Embedding(e) => Self::from_embedding_error(e),
            RetrievalError::Store(VectorStoreError::Io { source: e, .. })
            | RetrievalError::Io(e) => Self::from_io_error(e),
            RetrievalError::Store(_) | RetrievalError::DocIndex(_) => Self::Storage,
            RetrievalError::Config(_) | RetrievalError::InvalidInput(_) => Self::Unknown,
        }
    }

    fn from_embedding_error(error: &EmbeddingError) -> Self {
        match error {
            EmbeddingError::TextTooLong { .. } => Self::ResourceExhausted,
            _ => Self::Embedding,
        }
    }

    fn from_io_error(error: &std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::TimedOut => Self::Timeout,
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe => Self::Connection,
            ErrorKind::OutOfMemory => Self::ResourceExhausted,
            _ => Self::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sentinels_are_consistent() {
        for result in [
            ExplanationResult::not_documented(),
            ExplanationResult::no_selection(),
            ExplanationResult::failure(FailureKind::Storage),
        ] {
            assert!(!result.has_relevant_docs);
            assert!(result.citations.is_empty());
            assert_eq!(result.confidence, 0.0);
        }
        assert!(ExplanationResult::not_documented().is_not_documented());
        assert!(!ExplanationResult::no_selection().is_not_documented());
    }

    #[test]
    fn test_failure_messages_are_distinct() {
        let kinds = [
            FailureKind::Connection,
            FailureKind::Storage,
            FailureKind::Embedding,
            FailureKind::Timeout,
            FailureKind::ResourceExhausted,
            FailureKind::Unknown,
        ];
        let messages: std::collections::HashSet<&str> = kinds.iter().map(|k| k.message()).collect();
        assert_eq!(messages.len(), kinds.len());
        assert!(!messages.contains(NOT_DOCUMENTED));
    }

    #[test]
    fn test_classification() {
        let not_init = RetrievalError::Store(VectorStoreError::NotInitialized);
        assert_eq!(FailureKind::from_error(&not_init), FailureKind::Storage);

        let too_long = RetrievalError::Embedding(EmbeddingError::TextTooLong {
            length: 10,
            max_length: 5,
        });
        assert_eq!(FailureKind::from_error(&too_long), FailureKind::ResourceExhausted);

        let timeout = RetrievalError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert_eq!(FailureKind::from_error(&timeout), FailureKind::Timeout);

        let refused = RetrievalError::Store(VectorStoreError::Io {
            path: "index.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down"),
        });
        assert_eq!(FailureKind::from_error(&refused), FailureKind::Connection);
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = ExplanationResult::grounded(
            "Adds numbers.",
            vec![Citation {
                file_path: "README.md".to_string(),
                section_heading: "add".to_string(),
                relevance_score: 0.8,
            }],
            0.7,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["hasRelevantDocs"], true);
        assert_eq!(json["citations"][0]["sectionHeading"], "add");
        assert!(json.get("errorKind").is_none());
    }
}
