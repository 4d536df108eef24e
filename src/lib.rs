//! # Upsonic Knowledge Base - Rust Port
//!
//! Rust port of the Upsonic framework's knowledge base subsystem: a
//! collection of file-backed knowledge sources with lazy document-to-markdown
//! conversion and optional RAG (Retrieval-Augmented Generation) querying
//! through a pluggable engine and embedding backend.

pub mod knowledge_base;
pub mod markdown;
pub mod rag;
pub mod utilities;

// Re-exports matching the Python package surface.
pub use knowledge_base::KnowledgeBase;
pub use markdown::{DocumentConverter, MarkdownConverter};
pub use rag::{QueryMode, QueryParam, RagEngine, VectorStoreEngine};
pub use utilities::errors::KnowledgeBaseError;

/// Library version.
pub const VERSION: &str = "0.1.0";
