//! In-memory store — useful for testing and self-contained deployments.
//!
//! Scores documents by keyword occurrence rather than embeddings, so it
//! needs no external service. Good enough to exercise the full pipeline;
//! not a substitute for a real similarity index.

use async_trait::async_trait;
use groundwire_core::error::RetrievalError;
use groundwire_core::retrieval::{Passage, VectorStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A document held by the in-memory store.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub source: Option<String>,
}

/// An in-memory store that ranks documents by keyword occurrence.
pub struct InMemoryStore {
    documents: Arc<RwLock<Vec<Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a document to the corpus.
    pub async fn add(&self, content: impl Into<String>, source: Option<String>) {
        self.documents.write().await.push(Document {
            content: content.into(),
            source,
        });
    }

    /// Number of documents in the corpus.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        _filters: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<Passage>, RetrievalError> {
        let documents = self.documents.read().await;
        let query_lower = query_text.to_lowercase();

        // Score each document by how many query terms it contains,
        // normalized by document length.
        let terms: Vec<&str> = query_lower.split_whitespace().collect();

        let mut results: Vec<Passage> = documents
            .iter()
            .filter_map(|doc| {
                let content_lower = doc.content.to_lowercase();
                let occurrences: usize = terms
                    .iter()
                    .map(|t| content_lower.matches(t).count())
                    .sum();
                if occurrences == 0 {
                    return None;
                }
                let score = occurrences as f32 / (doc.content.len() as f32 / 100.0).max(1.0);
                Some(Passage {
                    content: doc.content.clone(),
                    score,
                    source: doc.source.clone(),
                })
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_ranks_by_keyword_occurrence() {
        let store = InMemoryStore::new();
        store
            .add("Refunds are available within 30 days of purchase.", None)
            .await;
        store
            .add("Shipping takes 5 days. Shipping is free over $50.", None)
            .await;
        store.add("Our office is closed on weekends.", None).await;

        let results = store
            .search("shipping", 10, &serde_json::Map::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].content.contains("Shipping"));
    }

    #[tokio::test]
    async fn search_respects_top_k() {
        let store = InMemoryStore::new();
        for i in 0..10 {
            store.add(format!("policy document number {i}"), None).await;
        }

        let results = store
            .search("policy", 3, &serde_json::Map::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn search_returns_descending_scores() {
        let store = InMemoryStore::new();
        store.add("refund refund refund", None).await;
        store.add("one refund mention in a much longer sentence about other things", None).await;

        let results = store
            .search("refund", 10, &serde_json::Map::new())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert_eq!(results[0].content, "refund refund refund");
    }

    #[tokio::test]
    async fn no_match_is_empty_success() {
        let store = InMemoryStore::new();
        store.add("Completely unrelated content.", None).await;

        let results = store
            .search("quantum chromodynamics", 10, &serde_json::Map::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn sources_carried_through() {
        let store = InMemoryStore::new();
        store
            .add("Refunds within 30 days", Some("faq.md".into()))
            .await;

        let results = store
            .search("refunds", 10, &serde_json::Map::new())
            .await
            .unwrap();
        assert_eq!(results[0].source.as_deref(), Some("faq.md"));
    }
}
