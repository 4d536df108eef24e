//! The knowledge base data object.
//!
//! Corresponds to `upsonic/knowledge_base/knowledge_base.py`.
//!
//! `KnowledgeBase` records a list of source file paths, lazily wires them into
//! a RAG engine for semantic querying, and can render all sources to a single
//! tagged markdown string.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::markdown::{DocumentConverter, MarkdownConverter};
use crate::rag::embeddings::embedding_for_model;
use crate::rag::engine::{RagEngine, VectorStoreEngine};
use crate::rag::types::{QueryMode, QueryParam};
use crate::utilities::error_wrapper::{with_error_report, with_error_report_blocking};
use crate::utilities::errors::KnowledgeBaseError;

const SETUP_MAX_RETRIES: u32 = 2;
const QUERY_MAX_RETRIES: u32 = 2;
const MARKDOWN_MAX_RETRIES: u32 = 1;

/// A collection of file-backed knowledge sources with optional RAG querying.
///
/// # Example
///
/// ```rust,no_run
/// use upsonic::KnowledgeBase;
///
/// let mut kb = KnowledgeBase::new().with_rag_model("openai");
/// kb.add_file("docs/handbook.pdf");
/// kb.add_file("docs/faq.md");
/// // let engine = kb.setup_rag(&upsonic::MarkdownConverter::new()).await?;
/// // let snippets = kb.query("vacation policy", Default::default()).await?;
/// ```
pub struct KnowledgeBase {
    /// Ordered list of source file paths.
    pub sources: Vec<String>,
    /// Embedding backend selector, prefix-matched at setup (e.g., "openai").
    pub rag_model: Option<String>,
    /// Engine handle, cached after the first successful setup.
    rag: OnceCell<Arc<dyn RagEngine>>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase {
    /// Create an empty knowledge base with no RAG backend configured.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            rag_model: None,
            rag: OnceCell::new(),
        }
    }

    /// Create a knowledge base with initial sources.
    pub fn with_sources(sources: Vec<String>) -> Self {
        Self {
            sources,
            rag_model: None,
            rag: OnceCell::new(),
        }
    }

    /// Builder: select the embedding backend.
    pub fn with_rag_model(mut self, rag_model: impl Into<String>) -> Self {
        self.rag_model = Some(rag_model.into());
        self
    }

    /// Append a source file path.
    pub fn add_file(&mut self, file_path: impl Into<String>) {
        self.sources.push(file_path.into());
    }

    /// Remove the first occurrence of a source file path.
    ///
    /// Returns `true` if a path was removed.
    pub fn remove_file(&mut self, file_path: &str) -> bool {
        match self.sources.iter().position(|p| p == file_path) {
            Some(index) => {
                self.sources.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether a RAG backend is configured (`rag_model` is set).
    pub fn rag_enabled(&self) -> bool {
        self.rag_model.is_some()
    }

    /// Initialize the RAG engine and ingest all sources.
    ///
    /// Idempotent: repeat calls return the cached engine handle without
    /// rebuilding or re-ingesting. Transient failures are retried up to
    /// 2 times with error details logged; missing or unsupported `rag_model`
    /// fails immediately.
    pub async fn setup_rag(
        &self,
        converter: &dyn DocumentConverter,
    ) -> Result<Arc<dyn RagEngine>, KnowledgeBaseError> {
        with_error_report("setup_rag", SETUP_MAX_RETRIES, true, || {
            self.setup_rag_once(converter)
        })
        .await
    }

    async fn setup_rag_once(
        &self,
        converter: &dyn DocumentConverter,
    ) -> Result<Arc<dyn RagEngine>, KnowledgeBaseError> {
        if let Some(engine) = self.rag.get() {
            return Ok(engine.clone());
        }

        let model = self
            .rag_model
            .as_deref()
            .ok_or(KnowledgeBaseError::MissingRagModel)?;
        let embedding = embedding_for_model(model)?;

        let engine: Arc<dyn RagEngine> = Arc::new(VectorStoreEngine::new(embedding));
        engine
            .initialize_storages()
            .await
            .map_err(KnowledgeBaseError::Engine)?;

        for source in &self.sources {
            let content = converter.convert(source)?;
            engine
                .insert(&content)
                .await
                .map_err(KnowledgeBaseError::Engine)?;
        }

        log::debug!(
            "KnowledgeBase: RAG engine ready (model={}, sources={})",
            model,
            self.sources.len()
        );
        // Concurrent setups race to this point; the first stored handle wins.
        let engine = self.rag.get_or_init(|| async move { engine }).await;
        Ok(engine.clone())
    }

    /// Query the initialized RAG engine for context snippets.
    ///
    /// Fails with [`KnowledgeBaseError::RagNotInitialized`] if `setup_rag`
    /// has not succeeded. Transient engine failures are retried up to 2 times.
    pub async fn query(
        &self,
        query: &str,
        mode: QueryMode,
    ) -> Result<Vec<String>, KnowledgeBaseError> {
        with_error_report("query", QUERY_MAX_RETRIES, true, || {
            self.query_once(query, mode)
        })
        .await
    }

    async fn query_once(
        &self,
        query: &str,
        mode: QueryMode,
    ) -> Result<Vec<String>, KnowledgeBaseError> {
        let engine = self.rag.get().ok_or(KnowledgeBaseError::RagNotInitialized)?;
        let param = QueryParam::new(mode).with_only_need_context(true);
        engine
            .query(query, &param)
            .await
            .map_err(KnowledgeBaseError::Engine)
    }

    /// Render all sources to one concatenated tagged-markdown string.
    ///
    /// Each source is wrapped in `<path>...</path>` tags, separated by blank
    /// lines, using the default [`MarkdownConverter`].
    pub fn markdown(&self) -> Result<String, KnowledgeBaseError> {
        self.markdown_with(&MarkdownConverter::new())
    }

    /// Render all sources with a caller-supplied converter.
    pub fn markdown_with(
        &self,
        converter: &dyn DocumentConverter,
    ) -> Result<String, KnowledgeBaseError> {
        with_error_report_blocking("markdown", MARKDOWN_MAX_RETRIES, true, || {
            let mut out = String::new();
            for path in &self.sources {
                let content = converter.convert(path)?;
                out.push_str(&format!("<{}>\n{}\n</{}>\n\n", path, content, path));
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Converter stub returning fixed content for any path.
    struct StaticConverter(&'static str);

    impl DocumentConverter for StaticConverter {
        fn convert(&self, _path: &str) -> Result<String, KnowledgeBaseError> {
            Ok(self.0.to_string())
        }
    }

    /// Converter stub that always fails.
    struct FailingConverter;

    impl DocumentConverter for FailingConverter {
        fn convert(&self, path: &str) -> Result<String, KnowledgeBaseError> {
            Err(KnowledgeBaseError::conversion(path, "unreadable"))
        }
    }

    #[test]
    fn test_add_then_remove_restores_sources() {
        let mut kb = KnowledgeBase::with_sources(vec!["a.md".to_string(), "b.md".to_string()]);
        kb.add_file("c.md");
        assert_eq!(kb.sources, vec!["a.md", "b.md", "c.md"]);
        assert!(kb.remove_file("c.md"));
        assert_eq!(kb.sources, vec!["a.md", "b.md"]);
    }

    #[test]
    fn test_remove_missing_file_reports_false() {
        let mut kb = KnowledgeBase::new();
        assert!(!kb.remove_file("missing.md"));
    }

    #[test]
    fn test_remove_file_drops_first_occurrence_only() {
        let mut kb = KnowledgeBase::with_sources(vec!["a.md".to_string(), "a.md".to_string()]);
        assert!(kb.remove_file("a.md"));
        assert_eq!(kb.sources, vec!["a.md"]);
    }

    #[test]
    fn test_rag_enabled_tracks_model() {
        let kb = KnowledgeBase::new();
        assert!(!kb.rag_enabled());
        let kb = kb.with_rag_model("openai");
        assert!(kb.rag_enabled());
    }

    #[tokio::test]
    async fn test_query_before_setup_fails() {
        let kb = KnowledgeBase::new().with_rag_model("openai");
        let err = kb.query("anything", QueryMode::Naive).await.unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::RagNotInitialized));
    }

    #[tokio::test]
    async fn test_setup_without_model_fails() {
        let kb = KnowledgeBase::new();
        let err = kb.setup_rag(&StaticConverter("text")).await.unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::MissingRagModel));
    }

    #[tokio::test]
    async fn test_setup_with_unknown_prefix_fails() {
        let kb = KnowledgeBase::new().with_rag_model("mistral/mistral-embed");
        let err = kb.setup_rag(&StaticConverter("text")).await.unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::UnsupportedRagModel { .. }
        ));
    }

    #[test]
    fn test_setup_is_idempotent() {
        let _ = env_logger::builder().is_test(true).try_init();
        // No sources, so setup never reaches the embedding backend.
        let kb = KnowledgeBase::new().with_rag_model("openai");
        let first = tokio_test::block_on(kb.setup_rag(&StaticConverter("text"))).unwrap();
        let second = tokio_test::block_on(kb.setup_rag(&StaticConverter("text"))).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_conversion_failure_retried_then_surfaced() {
        let kb = KnowledgeBase::with_sources(vec!["bad.pdf".to_string()]).with_rag_model("openai");
        let err = kb.setup_rag(&FailingConverter).await.unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::Conversion { .. }));
        assert!(err.to_string().contains("bad.pdf"));
    }

    #[test]
    fn test_markdown_wraps_sources_in_path_tags() {
        let kb = KnowledgeBase::with_sources(vec!["a.md".to_string(), "b.md".to_string()]);
        let rendered = kb.markdown_with(&StaticConverter("content")).unwrap();
        assert_eq!(
            rendered,
            "<a.md>\ncontent\n</a.md>\n\n<b.md>\ncontent\n</b.md>\n\n"
        );
    }

    #[test]
    fn test_markdown_empty_sources_renders_empty() {
        let kb = KnowledgeBase::new();
        assert_eq!(kb.markdown_with(&StaticConverter("x")).unwrap(), "");
    }

    #[test]
    fn test_markdown_conversion_failure_surfaces_path() {
        let kb = KnowledgeBase::with_sources(vec!["bad.pdf".to_string()]);
        let err = kb.markdown_with(&FailingConverter).unwrap_err();
        assert!(err.to_string().contains("bad.pdf"));
    }
}
