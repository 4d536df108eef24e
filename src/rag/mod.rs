//! RAG (Retrieval-Augmented Generation) layer.
//!
//! Engine trait, query types, and embedding backend selection for the
//! knowledge base.

pub mod embeddings;
pub mod engine;
pub mod types;

pub use embeddings::{embedding_for_model, EmbeddingFunction};
pub use engine::{RagEngine, VectorStoreEngine};
pub use types::{Embeddings, QueryMode, QueryParam};
