//! Query-time retrieval against the vector store.
//!
//! Validates the query before any network call, issues exactly one search,
//! and normalizes the result to strict descending-score order. Zero results
//! is a valid outcome — the turn proceeds ungrounded.

use std::sync::Arc;

use groundwire_core::error::{Error, Result};
use groundwire_core::retrieval::{Passage, Query, VectorStore};
use tracing::debug;

/// Wraps one similarity search per turn.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Retrieve up to `top_k` passages for the query, descending by score.
    ///
    /// A `top_k` carried on the query overrides the argument. The sort is
    /// stable, so equal scores keep the store's original order.
    pub async fn retrieve(&self, query: &Query, top_k: usize) -> Result<Vec<Passage>> {
        let text = query.text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".into()));
        }

        let k = query.top_k.unwrap_or(top_k);
        if k == 0 {
            return Err(Error::InvalidInput(
                "top_k must be a positive integer".into(),
            ));
        }

        let mut passages = self.store.search(text, k, &query.filters).await?;

        passages.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        passages.truncate(k);

        debug!(
            store = self.store.name(),
            count = passages.len(),
            top_k = k,
            "Retrieved passages"
        );

        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwire_core::error::RetrievalError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A store returning a fixed passage list, counting calls.
    struct FixedStore {
        passages: Vec<Passage>,
        calls: AtomicUsize,
    }

    impl FixedStore {
        fn new(passages: Vec<Passage>) -> Self {
            Self {
                passages,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl VectorStore for FixedStore {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(
            &self,
            _query_text: &str,
            top_k: usize,
            _filters: &serde_json::Map<String, serde_json::Value>,
        ) -> std::result::Result<Vec<Passage>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut result = self.passages.clone();
            result.truncate(top_k);
            Ok(result)
        }
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl VectorStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn search(
            &self,
            _query_text: &str,
            _top_k: usize,
            _filters: &serde_json::Map<String, serde_json::Value>,
        ) -> std::result::Result<Vec<Passage>, RetrievalError> {
            Err(RetrievalError::Unreachable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn empty_query_fails_before_the_store_call() {
        let store = Arc::new(FixedStore::new(vec![Passage::new("doc", 1.0)]));
        let retriever = Retriever::new(store.clone());

        let err = retriever
            .retrieve(&Query::new("   \t  "), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_top_k_rejected() {
        let store = Arc::new(FixedStore::new(vec![]));
        let retriever = Retriever::new(store);
        let err = retriever.retrieve(&Query::new("refunds"), 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn results_sorted_descending_and_capped() {
        let store = Arc::new(FixedStore::new(vec![
            Passage::new("low", 0.2),
            Passage::new("high", 0.9),
            Passage::new("mid", 0.5),
        ]));
        let retriever = Retriever::new(store);

        let passages = retriever.retrieve(&Query::new("anything"), 2).await.unwrap();
        assert_eq!(passages.len(), 2);
        assert!(passages.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn equal_scores_keep_store_order() {
        let store = Arc::new(FixedStore::new(vec![
            Passage::new("first", 0.5),
            Passage::new("second", 0.5),
            Passage::new("third", 0.5),
        ]));
        let retriever = Retriever::new(store);

        let passages = retriever.retrieve(&Query::new("anything"), 10).await.unwrap();
        let order: Vec<&str> = passages.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn query_top_k_overrides_argument() {
        let store = Arc::new(FixedStore::new(
            (0..10).map(|i| Passage::new(format!("p{i}"), 1.0)).collect(),
        ));
        let retriever = Retriever::new(store);

        let query = Query::new("anything").with_top_k(3);
        let passages = retriever.retrieve(&query, 10).await.unwrap();
        assert_eq!(passages.len(), 3);
    }

    #[tokio::test]
    async fn zero_results_is_success() {
        let store = Arc::new(FixedStore::new(vec![]));
        let retriever = Retriever::new(store);
        let passages = retriever.retrieve(&Query::new("nothing matches"), 10).await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_retrieval_error() {
        let retriever = Retriever::new(Arc::new(FailingStore));
        let err = retriever.retrieve(&Query::new("refunds"), 10).await.unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
    }
}
