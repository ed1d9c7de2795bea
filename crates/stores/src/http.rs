//! HTTP vector store client.
//!
//! Talks to a remote similarity-search service over a minimal JSON contract:
//!
//! ```text
//! POST {base_url}/search
//! { "query": "...", "top_k": 10, "filters": { ... } }
//! → [ { "content": "...", "score": 0.93, "source": "faq.md" }, ... ]
//! ```
//!
//! One search request per `search` call; the store's own caching, if any,
//! is opaque to us.

use async_trait::async_trait;
use groundwire_core::error::RetrievalError;
use groundwire_core::retrieval::{Passage, VectorStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A client for an HTTP similarity-search service.
pub struct HttpVectorStore {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpVectorStore {
    /// Create a new client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            client,
        }
    }

    /// Attach an API key sent as a bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    filters: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct SearchHit {
    content: String,
    score: f32,
    #[serde(default)]
    source: Option<String>,
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        filters: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<Passage>, RetrievalError> {
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest {
            query: query_text,
            top_k,
            filters: filters.clone(),
        };

        debug!(store = "http", top_k, "Sending similarity search");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Vector store error");
            return Err(RetrievalError::Store {
                status_code: status,
                message: error_body,
            });
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| RetrievalError::Malformed(e.to_string()))?;

        Ok(hits
            .into_iter()
            .map(|h| Passage {
                content: h.content,
                score: h.score,
                source: h.source,
            })
            .collect())
    }
}
