//! # Groundwire Core
//!
//! Domain types, traits, and error definitions for the Groundwire
//! retrieval-augmented generation pipeline. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators — the vector store and the model service —
//! are defined as traits here. Implementations live in their respective
//! crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod model;
pub mod retrieval;
pub mod settings;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GenerationError, Result, RetrievalError, TurnStage};
pub use message::{ConversationThread, Message, Role, ThreadId};
pub use model::{Fragment, GenerationModel, Prompt, PromptMessage};
pub use retrieval::{Passage, Query, VectorStore};
pub use settings::{ModelParameters, ThreadConfig};
