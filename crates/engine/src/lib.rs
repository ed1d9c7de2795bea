//! The Groundwire orchestration core.
//!
//! One turn flows through five stages:
//!
//! 1. **Retrieve** — one similarity search against the vector store
//! 2. **Assemble** — merge ranked passages into a bounded context block
//! 3. **Prompt** — preamble + context + history window + the new query
//! 4. **Generate** — stream fragments from the model service, cancellable
//! 5. **Commit** — append the full answer to the thread's append-only log
//!
//! Retrieval and generation failures are isolated from each other: an empty
//! retrieval degrades to an ungrounded prompt, while a store outage aborts
//! the turn before the model is ever called.

pub mod context;
pub mod invoker;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod retriever;

pub use context::{ContextAssembler, ContextBlock};
pub use invoker::{FragmentStream, GenerationInvoker};
pub use orchestrator::{Orchestrator, TurnEvent, TurnStream};
pub use prompt::PromptBuilder;
pub use registry::{ThreadEntry, ThreadRegistry};
pub use retriever::Retriever;
