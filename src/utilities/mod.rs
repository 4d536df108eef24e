//! Shared utilities for the knowledge base.
//!
//! Corresponds to `upsonic/utils/`.

pub mod error_wrapper;
pub mod errors;

pub use error_wrapper::{with_error_report, with_error_report_blocking};
pub use errors::KnowledgeBaseError;
