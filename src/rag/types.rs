//! Type definitions for the RAG layer.
//!
//! `QueryMode` and `QueryParam` mirror the LightRAG query surface the Python
//! knowledge base passes through (`QueryParam(mode=mode, only_need_context=True)`).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type alias for embedding vectors. Each embedding is a vector of f32 values.
pub type Embeddings = Vec<Vec<f32>>;

/// Retrieval strategy for a RAG query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Plain chunk retrieval by vector similarity.
    #[default]
    Naive,
    /// Entity-centric retrieval.
    Local,
    /// Relationship-centric retrieval.
    Global,
    /// Combined local and global retrieval.
    Hybrid,
    /// Mixed graph and vector retrieval.
    Mix,
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueryMode::Naive => "naive",
            QueryMode::Local => "local",
            QueryMode::Global => "global",
            QueryMode::Hybrid => "hybrid",
            QueryMode::Mix => "mix",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for QueryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "naive" => Ok(QueryMode::Naive),
            "local" => Ok(QueryMode::Local),
            "global" => Ok(QueryMode::Global),
            "hybrid" => Ok(QueryMode::Hybrid),
            "mix" => Ok(QueryMode::Mix),
            other => Err(anyhow::anyhow!("Unknown query mode: {}", other)),
        }
    }
}

/// Parameters for a RAG engine query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParam {
    /// Retrieval strategy.
    #[serde(default)]
    pub mode: QueryMode,
    /// Return only the retrieved context snippets, without LLM synthesis.
    #[serde(default)]
    pub only_need_context: bool,
    /// Maximum number of snippets to return.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum similarity score for returned snippets.
    #[serde(default)]
    pub score_threshold: f64,
}

fn default_top_k() -> usize {
    5
}

impl Default for QueryParam {
    fn default() -> Self {
        Self {
            mode: QueryMode::default(),
            only_need_context: false,
            top_k: default_top_k(),
            score_threshold: 0.0,
        }
    }
}

impl QueryParam {
    /// Create parameters for the given mode with defaults otherwise.
    pub fn new(mode: QueryMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Builder: request context snippets only.
    pub fn with_only_need_context(mut self, only_need_context: bool) -> Self {
        self.only_need_context = only_need_context;
        self
    }

    /// Builder: set the result limit.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Builder: set the score threshold.
    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_mode_roundtrip() {
        for mode in [
            QueryMode::Naive,
            QueryMode::Local,
            QueryMode::Global,
            QueryMode::Hybrid,
            QueryMode::Mix,
        ] {
            let parsed: QueryMode = mode.to_string().parse().unwrap();
            assert_eq!(parsed, mode);
        }
    }

    #[test]
    fn test_query_mode_unknown_fails() {
        assert!("semantic".parse::<QueryMode>().is_err());
    }

    #[test]
    fn test_query_param_defaults() {
        let param = QueryParam::default();
        assert_eq!(param.mode, QueryMode::Naive);
        assert!(!param.only_need_context);
        assert_eq!(param.top_k, 5);
    }

    #[test]
    fn test_query_param_builders() {
        let param = QueryParam::new(QueryMode::Hybrid)
            .with_only_need_context(true)
            .with_top_k(10)
            .with_score_threshold(0.35);
        assert_eq!(param.mode, QueryMode::Hybrid);
        assert!(param.only_need_context);
        assert_eq!(param.top_k, 10);
        assert!((param.score_threshold - 0.35).abs() < f64::EPSILON);
    }
}
