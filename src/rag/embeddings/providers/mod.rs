//! Embedding provider implementations.
//!
//! Currently only the OpenAI backend is supported, matching the Python
//! knowledge base's prefix check.

pub mod openai;
