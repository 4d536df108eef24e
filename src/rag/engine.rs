//! RAG engine trait and the built-in vector store engine.
//!
//! The Python knowledge base delegates to LightRAG
//! (`initialize_storages` / `ainsert` / `aquery`). The `RagEngine` trait keeps
//! that surface; `VectorStoreEngine` is the built-in implementation that
//! chunks inserted text, delegates embedding to an [`EmbeddingFunction`], and
//! answers queries by cosine-similarity top-k.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::rag::embeddings::EmbeddingFunction;
use crate::rag::types::{QueryMode, QueryParam};

const DEFAULT_CHUNK_SIZE: usize = 4000;
const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Trait for RAG engine implementations.
///
/// Mirrors the LightRAG entry points the knowledge base calls.
#[async_trait]
pub trait RagEngine: Send + Sync + std::fmt::Debug {
    /// Initialize the engine's storage backends. Must be called before
    /// `insert` or `query`.
    async fn initialize_storages(&self) -> Result<(), anyhow::Error>;

    /// Ingest a document's text content.
    async fn insert(&self, content: &str) -> Result<(), anyhow::Error>;

    /// Retrieve context snippets relevant to the query.
    async fn query(&self, query: &str, param: &QueryParam) -> Result<Vec<String>, anyhow::Error>;
}

#[derive(Debug)]
struct StoredChunk {
    content: String,
    embedding: Vec<f32>,
}

/// In-memory RAG engine backed by an embedding function.
///
/// Inserted documents are chunked with a sliding window, embedded in batch,
/// and held in memory. Queries embed the query string and rank chunks by
/// cosine similarity. Graph-based query modes (`local`, `global`, `hybrid`,
/// `mix`) fall back to naive vector retrieval.
#[derive(Debug)]
pub struct VectorStoreEngine {
    embedding: Arc<dyn EmbeddingFunction>,
    chunk_size: usize,
    chunk_overlap: usize,
    initialized: AtomicBool,
    store: RwLock<Vec<StoredChunk>>,
}

impl VectorStoreEngine {
    /// Create an engine with default chunking parameters.
    pub fn new(embedding: Arc<dyn EmbeddingFunction>) -> Self {
        Self {
            embedding,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            initialized: AtomicBool::new(false),
            store: RwLock::new(Vec::new()),
        }
    }

    /// Builder: override chunking parameters.
    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap.min(chunk_size.saturating_sub(1));
        self
    }

    /// Number of chunks currently stored.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether the store holds no chunks.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    fn ensure_initialized(&self) -> Result<(), anyhow::Error> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Engine storages not initialized. Call initialize_storages first."
            ))
        }
    }

    /// Split text into chunks with a sliding window, respecting UTF-8
    /// character boundaries.
    fn chunk_text(&self, text: &str) -> Vec<String> {
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let step = self.chunk_size - self.chunk_overlap;

        while start < text.len() {
            let end = floor_char_boundary(text, start + self.chunk_size);
            chunks.push(text[start..end].to_string());
            if end == text.len() {
                break;
            }
            start = floor_char_boundary(text, start + step).max(start + 1);
            start = ceil_char_boundary(text, start);
        }

        chunks
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Cosine similarity between two vectors; 0.0 when either norm is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl RagEngine for VectorStoreEngine {
    async fn initialize_storages(&self) -> Result<(), anyhow::Error> {
        self.initialized.store(true, Ordering::Release);
        log::debug!(
            "VectorStoreEngine initialized (model={}, chunk_size={}, chunk_overlap={})",
            self.embedding.model_name(),
            self.chunk_size,
            self.chunk_overlap
        );
        Ok(())
    }

    async fn insert(&self, content: &str) -> Result<(), anyhow::Error> {
        self.ensure_initialized()?;
        if content.trim().is_empty() {
            return Ok(());
        }

        let chunks = self.chunk_text(content);
        let embeddings = self.embedding.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(anyhow::anyhow!(
                "Embedding function returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            ));
        }

        let mut store = self.store.write().await;
        for (content, embedding) in chunks.into_iter().zip(embeddings) {
            store.push(StoredChunk { content, embedding });
        }
        log::debug!("VectorStoreEngine insert: store now holds {} chunks", store.len());
        Ok(())
    }

    async fn query(&self, query: &str, param: &QueryParam) -> Result<Vec<String>, anyhow::Error> {
        self.ensure_initialized()?;
        if query.is_empty() {
            return Err(anyhow::anyhow!("Query cannot be empty"));
        }
        if param.mode != QueryMode::Naive {
            log::debug!(
                "VectorStoreEngine: mode '{}' falls back to naive retrieval",
                param.mode
            );
        }

        let query_embedding = self.embedding.embed_query(query).await?;

        let store = self.store.read().await;
        let mut scored: Vec<(f64, &StoredChunk)> = store
            .iter()
            .map(|chunk| (cosine_similarity(&query_embedding, &chunk.embedding), chunk))
            .filter(|(score, _)| *score >= param.score_threshold)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(param.top_k)
            .map(|(_, chunk)| chunk.content.clone())
            .collect())
    }
}
