//! Error types for the Upsonic knowledge base.
//!
//! Corresponds to the `ValueError`s raised in
//! `upsonic/knowledge_base/knowledge_base.py`.

use thiserror::Error;

/// Errors raised by knowledge base operations.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// No embedding backend was configured before setup.
    #[error("rag_model must be set before querying")]
    MissingRagModel,

    /// The configured model identifier does not match a supported backend prefix.
    #[error("Unsupported rag_model type: {model}")]
    UnsupportedRagModel { model: String },

    /// The RAG engine was queried before `setup_rag` succeeded.
    #[error("RAG system not initialized. Call setup_rag first.")]
    RagNotInitialized,

    /// A source file could not be converted to markdown.
    #[error("Failed to convert {path}: {message}")]
    Conversion { path: String, message: String },

    /// The RAG engine or embedding backend reported a failure.
    #[error("RAG engine error: {0}")]
    Engine(#[source] anyhow::Error),
}

impl KnowledgeBaseError {
    /// Build a conversion error for a source path.
    pub fn conversion(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Conversion {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error reflects caller configuration rather than a
    /// transient failure. Configuration errors are never retried.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingRagModel | Self::UnsupportedRagModel { .. } | Self::RagNotInitialized
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_flagged() {
        assert!(KnowledgeBaseError::MissingRagModel.is_configuration());
        assert!(KnowledgeBaseError::RagNotInitialized.is_configuration());
        assert!(KnowledgeBaseError::UnsupportedRagModel {
            model: "mistral".to_string()
        }
        .is_configuration());
        assert!(!KnowledgeBaseError::conversion("a.txt", "io error").is_configuration());
    }

    #[test]
    fn test_error_messages_match_source() {
        assert_eq!(
            KnowledgeBaseError::MissingRagModel.to_string(),
            "rag_model must be set before querying"
        );
        assert_eq!(
            KnowledgeBaseError::RagNotInitialized.to_string(),
            "RAG system not initialized. Call setup_rag first."
        );
    }
}
