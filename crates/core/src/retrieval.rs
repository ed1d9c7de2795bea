//! Retrieval domain types and the vector store contract.
//!
//! The vector store is an external collaborator: Groundwire consumes its
//! query contract only. Indexing, embedding computation, and storage are the
//! store's own business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// A query for one retrieval pass. Created at turn start, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The search text
    pub text: String,

    /// Optional per-query override of the thread's top_k
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    /// Opaque filters passed through to the vector store
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub filters: serde_json::Map<String, serde_json::Value>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            top_k: None,
            filters: serde_json::Map::new(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.filters.insert(key.into(), value);
        self
    }
}

/// A retrieved unit of source content with a relevance score.
/// Higher score = more relevant. Lifetime: one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// The text content of this passage
    pub content: String,

    /// Relevance score from the store's similarity search
    pub score: f32,

    /// Human-readable source label (filename, URL, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Passage {
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            score,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// The vector store contract.
///
/// `search` must be idempotent and side-effect-free from the caller's
/// perspective; one call issues exactly one similarity search. Zero results
/// is a valid success, distinct from the store being unreachable.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// A human-readable name for this store (e.g., "http", "in_memory").
    fn name(&self) -> &str;

    /// Run one similarity search, returning passages ranked descending by
    /// score. Implementations may return fewer than `top_k` results.
    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<Vec<Passage>, RetrievalError>;
}
