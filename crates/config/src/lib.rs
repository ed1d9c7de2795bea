//! Configuration loading, validation, and management for Groundwire.
//!
//! Loads configuration from a TOML file with environment variable overrides.
//! Validates all settings at startup — a bad config is fatal before the
//! first turn, never a per-turn surprise. Unknown fields are rejected at
//! parse time.

use groundwire_core::settings::{ModelParameters, ThreadConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The root configuration structure.
///
/// Maps directly to `groundwire.toml`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Defaults applied to every new thread
    #[serde(default)]
    pub pipeline: ThreadConfig,

    /// Vector store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Model service connection
    #[serde(default)]
    pub model_service: ModelServiceConfig,

    /// Gateway listener
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Per-thread overrides keyed by thread_id
    #[serde(default)]
    pub threads: HashMap<String, ThreadOverrides>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipeline: ThreadConfig::default(),
            store: StoreConfig::default(),
            model_service: ModelServiceConfig::default(),
            gateway: GatewayConfig::default(),
            threads: HashMap::new(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("pipeline", &self.pipeline)
            .field("store", &self.store)
            .field("model_service", &self.model_service)
            .field("gateway", &self.gateway)
            .field("threads", &self.threads)
            .finish()
    }
}

/// Which vector store backend to use and how to reach it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// "in_memory" or "http"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Base URL of the similarity-search service (http backend only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key for the store, if it requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_store_backend() -> String {
    "in_memory".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            base_url: None,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// How to reach the generation model service.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelServiceConfig {
    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_model_base_url")]
    pub base_url: String,

    /// API key for the model service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_model_base_url() -> String {
    "https://api.openai.com/v1".into()
}

impl Default for ModelServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_model_base_url(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for ModelServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelServiceConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Gateway listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8460
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Optional per-thread overrides, overlaid on the pipeline defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_chars: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_window: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelParameters>,
}

impl ThreadOverrides {
    /// Overlay these overrides onto a base configuration.
    pub fn apply(&self, base: &ThreadConfig) -> ThreadConfig {
        ThreadConfig {
            top_k: self.top_k.unwrap_or(base.top_k),
            max_context_chars: self.max_context_chars.unwrap_or(base.max_context_chars),
            history_window: self.history_window.unwrap_or(base.history_window),
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            model: self.model.clone().unwrap_or_else(|| base.model.clone()),
        }
    }
}

impl AppConfig {
    /// Load configuration from the given path. A missing file yields the
    /// defaults; a present-but-invalid file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Apply `GROUNDWIRE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GROUNDWIRE_MODEL_API_KEY") {
            self.model_service.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("GROUNDWIRE_MODEL_URL") {
            self.model_service.base_url = url;
        }
        if let Ok(key) = std::env::var("GROUNDWIRE_STORE_API_KEY") {
            self.store.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("GROUNDWIRE_STORE_URL") {
            self.store.base_url = Some(url);
        }
        if let Ok(port) = std::env::var("GROUNDWIRE_PORT")
            && let Ok(port) = port.parse()
        {
            self.gateway.port = port;
        }
    }

    /// The effective configuration for a thread: pipeline defaults plus any
    /// `[threads.<id>]` overrides.
    pub fn resolve_thread(&self, thread_id: &str) -> ThreadConfig {
        match self.threads.get(thread_id) {
            Some(overrides) => overrides.apply(&self.pipeline),
            None => self.pipeline.clone(),
        }
    }

    /// Validate the entire configuration. Run once at startup; any violation
    /// is fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        for (thread_id, overrides) in &self.threads {
            overrides.apply(&self.pipeline).validate().map_err(|e| {
                ConfigError::ValidationError(format!("[threads.{thread_id}]: {e}"))
            })?;
        }

        match self.store.backend.as_str() {
            "in_memory" => {}
            "http" => {
                if self.store.base_url.is_none() {
                    return Err(ConfigError::ValidationError(
                        "store.base_url is required for the http backend".into(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown store backend: {other}"
                )));
            }
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be nonzero".into(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
