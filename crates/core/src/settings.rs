//! Per-thread retrieval and generation settings.
//!
//! Every knob is explicit and enumerated — there are no hidden constants.
//! `history_window` deliberately has no default: it bounds what the prompt
//! carries and must be chosen by the deployment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters passed through to the model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// The model to request (e.g., "gpt-4o", "claude-sonnet-4")
    pub model: String,

    /// Temperature (0.0 = deterministic, higher = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Opaque extra parameters forwarded to the service untouched
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            temperature: default_temperature(),
            max_tokens: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// The retrieval/generation configuration in effect for one thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadConfig {
    /// How many passages to request from the vector store
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Upper bound on the assembled context block, in chars
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// How many recent messages the prompt carries. Required; oldest
    /// messages beyond the window are dropped first.
    pub history_window: usize,

    /// Per-turn budget in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Model-service parameters, passed through opaquely
    #[serde(default)]
    pub model: ModelParameters,
}

fn default_top_k() -> usize {
    10
}
fn default_max_context_chars() -> usize {
    6_000
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
            history_window: 20,
            timeout_secs: default_timeout_secs(),
            model: ModelParameters::default(),
        }
    }
}

impl ThreadConfig {
    /// Validate every field. Violations are programming/setup errors and
    /// must be fatal at startup, never surfaced per-turn.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::config("top_k must be a positive integer"));
        }
        if self.max_context_chars == 0 {
            return Err(Error::config("max_context_chars must be positive"));
        }
        if self.history_window == 0 {
            return Err(Error::config("history_window must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be positive"));
        }
        if self.model.model.trim().is_empty() {
            return Err(Error::config("model name must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(Error::config(format!(
                "temperature must be in [0.0, 2.0], got {}",
                self.model.temperature
            )));
        }
        Ok(())
    }
}
