//! Error types for the Groundwire domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each pipeline stage has its own bounded-context error type; the top-level
//! `Error` is what a turn surfaces to its caller.

use thiserror::Error;

/// The stage of a turn, used to label timeouts and trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    Retrieving,
    Assembling,
    Prompting,
    Generating,
    Committing,
}

impl std::fmt::Display for TurnStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Retrieving => "retrieving",
            Self::Assembling => "assembling",
            Self::Prompting => "prompting",
            Self::Generating => "generating",
            Self::Committing => "committing",
        };
        write!(f, "{name}")
    }
}

/// The top-level error type for all Groundwire turn operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad query or per-turn input. User-correctable, surfaced verbatim.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Retrieval errors ---
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Generation errors ---
    /// A model-service failure. Carries whatever partial text had already
    /// been streamed, so the caller can decide whether to keep it.
    #[error("Generation failed: {source}")]
    Generation {
        source: GenerationError,
        partial: Option<String>,
    },

    /// A stage exceeded the per-turn budget.
    #[error("Turn timed out while {stage} (budget: {budget_secs}s)")]
    Timeout { stage: TurnStage, budget_secs: u64 },

    // --- Configuration errors ---
    /// Programming/setup error. Fatal at startup validation, never per-turn.
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// A stable, non-internal message suitable for end users.
    ///
    /// `InvalidInput` is user-correctable and passes through verbatim; every
    /// other variant maps to a generic phrasing so raw store/model errors
    /// never reach the chat surface.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::Retrieval(_) => {
                "Couldn't search your documents right now. Please try again.".into()
            }
            Self::Generation { partial, .. } => {
                if partial.as_deref().is_some_and(|p| !p.is_empty()) {
                    "The answer was interrupted before it finished.".into()
                } else {
                    "Couldn't generate an answer right now. Please try again.".into()
                }
            }
            Self::Timeout { .. } => "The request took too long and was stopped.".into(),
            Self::Config { .. } | Self::Serialization(_) => {
                "Something went wrong on our side. Please try again.".into()
            }
        }
    }

    /// Convenience constructor for configuration violations.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// --- Bounded context errors ---

/// Failures from the vector store collaborator.
///
/// "Zero results" is NOT an error — an empty passage list is a valid success
/// and the turn proceeds ungrounded.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Vector store unreachable: {0}")]
    Unreachable(String),

    #[error("Vector store returned a malformed response: {0}")]
    Malformed(String),

    #[error("Vector store error: {message} (status: {status_code})")]
    Store { status_code: u16, message: String },
}

/// Failures from the model-service collaborator.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by model service, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Network error: {0}")]
    Network(String),
}
