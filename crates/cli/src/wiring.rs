//! Assembling the pipeline from configuration.

use std::sync::Arc;

use groundwire_config::AppConfig;
use groundwire_core::model::GenerationModel;
use groundwire_core::retrieval::VectorStore;
use groundwire_engine::{Orchestrator, ThreadRegistry};
use groundwire_providers::OpenAiCompatModel;
use groundwire_stores::{HttpVectorStore, InMemoryStore};

/// Build the vector store named by the configuration.
///
/// Returns the trait object plus, for the in_memory backend, a handle the
/// caller can seed documents into.
pub fn build_store(config: &AppConfig) -> (Arc<dyn VectorStore>, Option<Arc<InMemoryStore>>) {
    match config.store.backend.as_str() {
        "http" => {
            // validate() guarantees base_url is present for this backend.
            let base_url = config.store.base_url.clone().unwrap_or_default();
            let mut store = HttpVectorStore::new(base_url);
            if let Some(key) = &config.store.api_key {
                store = store.with_api_key(key);
            }
            (Arc::new(store), None)
        }
        _ => {
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), Some(store))
        }
    }
}

/// Build the model client from configuration.
pub fn build_model(config: &AppConfig) -> Arc<dyn GenerationModel> {
    Arc::new(OpenAiCompatModel::new(
        "openai_compat",
        config.model_service.base_url.clone(),
        config.model_service.api_key.clone().unwrap_or_default(),
    ))
}

/// Build the registry with pipeline defaults and per-thread overrides.
pub fn build_registry(config: &AppConfig) -> Arc<ThreadRegistry> {
    let mut registry = ThreadRegistry::new(config.pipeline.clone());
    for thread_id in config.threads.keys() {
        registry = registry.with_thread_config(thread_id, config.resolve_thread(thread_id));
    }
    Arc::new(registry)
}

/// Build the full orchestrator, returning the in-memory store handle when
/// that backend is in use.
pub fn build_orchestrator(config: &AppConfig) -> (Arc<Orchestrator>, Option<Arc<InMemoryStore>>) {
    let (store, seedable) = build_store(config);
    let model = build_model(config);
    let registry = build_registry(config);
    (
        Arc::new(Orchestrator::new(registry, store, model)),
        seedable,
    )
}
