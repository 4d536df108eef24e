//! Embedding function abstractions and backend selection.
//!
//! The Python knowledge base selects an embedding function by string-prefix
//! match on `rag_model` (`openai...` maps to `lightrag.llm.openai.openai_embed`;
//! anything else is rejected). This module keeps that contract behind the
//! `EmbeddingFunction` trait.

pub mod providers;

use std::sync::Arc;

use async_trait::async_trait;

use crate::rag::types::Embeddings;
use crate::utilities::errors::KnowledgeBaseError;

pub use providers::openai::{OpenAIEmbedding, OpenAIEmbeddingConfig};

/// Trait for embedding functions.
///
/// Converts batches of input text into vector embeddings.
#[async_trait]
pub trait EmbeddingFunction: Send + Sync + std::fmt::Debug {
    /// Name of the embedding model (for logging).
    fn model_name(&self) -> &str;

    /// Embed a batch of input texts, one vector per input.
    async fn embed(&self, input: &[String]) -> Result<Embeddings, anyhow::Error>;

    /// Embed a single query string.
    async fn embed_query(&self, input: &str) -> Result<Vec<f32>, anyhow::Error> {
        let results = self.embed(&[input.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Embedding function returned no results"))
    }
}

/// Resolve an embedding function from a `rag_model` identifier.
///
/// The identifier is prefix-matched: `"openai"` or `"openai/<model-name>"`
/// selects the OpenAI backend. Any other prefix is unsupported.
pub fn embedding_for_model(
    model: &str,
) -> Result<Arc<dyn EmbeddingFunction>, KnowledgeBaseError> {
    if model.starts_with("openai") {
        Ok(Arc::new(OpenAIEmbedding::for_rag_model(model)))
    } else {
        Err(KnowledgeBaseError::UnsupportedRagModel {
            model: model.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_prefix_resolves() {
        let func = embedding_for_model("openai").unwrap();
        assert_eq!(func.model_name(), "text-embedding-3-small");
    }

    #[test]
    fn test_openai_prefix_with_model_name() {
        let func = embedding_for_model("openai/text-embedding-3-large").unwrap();
        assert_eq!(func.model_name(), "text-embedding-3-large");
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let err = embedding_for_model("mistral/mistral-embed").unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::UnsupportedRagModel { .. }
        ));
        assert!(err.to_string().contains("mistral/mistral-embed"));
    }
}
