//! The generation model contract — the abstraction over LLM services.
//!
//! A `GenerationModel` knows how to turn a prompt into a finite stream of
//! fragments. The stream is not restartable; regenerating means a new call.
//! Cancellation is drop-based: when the receiver goes away the
//! implementation's sends fail and it must stop consuming the wire.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::message::Role;
use crate::settings::ModelParameters;

/// One incremental piece of a streamed model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Role tag from the model service, when it sends one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// The text delta
    pub text: String,
}

impl Fragment {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            text: text.into(),
        }
    }
}

/// A model-ready prompt. Derived, transient, never stored — it exists only
/// for the duration of one `generate_stream` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    /// The grounding preamble plus the labeled context block
    pub system: String,

    /// Bounded history window followed by the new user query
    pub messages: Vec<PromptMessage>,
}

/// One turn of conversation as sent to the model service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// The generation model contract.
///
/// Exactly one outbound call to the model service per invocation. The
/// returned channel closes when the model signals completion; a mid-stream
/// service error arrives as an `Err` item and ends the stream.
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// A human-readable name for this model client (e.g., "openai_compat").
    fn name(&self) -> &str;

    /// Submit a prompt and stream back fragments as they arrive.
    async fn generate_stream(
        &self,
        prompt: Prompt,
        params: &ModelParameters,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<Fragment, GenerationError>>,
        GenerationError,
    >;
}
