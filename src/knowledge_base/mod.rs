//! Knowledge base module.
//!
//! Corresponds to `upsonic/knowledge_base/`.

pub mod knowledge_base;

pub use self::knowledge_base::KnowledgeBase;
