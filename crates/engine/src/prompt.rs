//! Prompt construction — context, history, and query in a fixed order.
//!
//! The produced prompt is: (a) the grounding preamble, (b) the context block
//! under its own label, (c) the most recent `history_window` messages, and
//! (d) the new user query. When retrieval produced nothing the context
//! section is omitted entirely and the model answers ungrounded.

use groundwire_core::message::{Message, Role};
use groundwire_core::model::{Prompt, PromptMessage};

use crate::context::ContextBlock;

/// Instructional preamble establishing grounded-answer behavior.
const GROUNDING_PREAMBLE: &str = "You are a helpful assistant. Answer using the retrieved \
context below when it is relevant. If the context does not contain the answer, say so \
rather than inventing one.";

/// Label separating retrieved context from conversation history.
const CONTEXT_LABEL: &str = "[Retrieved Context]";

/// Builds model-ready prompts with a bounded history window.
pub struct PromptBuilder {
    history_window: usize,
}

impl PromptBuilder {
    /// `history_window` is required configuration — how many recent messages
    /// the prompt carries. Oldest messages are dropped first.
    pub fn new(history_window: usize) -> Self {
        Self { history_window }
    }

    /// Build the prompt for one turn. `history` is the thread's log *before*
    /// the current query; the query is appended as the final user message.
    pub fn build(&self, context: &ContextBlock, history: &[Message], query_text: &str) -> Prompt {
        let mut system = String::from(GROUNDING_PREAMBLE);
        if !context.is_empty() {
            system.push_str("\n\n");
            system.push_str(CONTEXT_LABEL);
            system.push('\n');
            system.push_str(context.as_str());
        }

        let start = history.len().saturating_sub(self.history_window);
        let mut messages: Vec<PromptMessage> = history[start..]
            .iter()
            .map(|m| PromptMessage::new(m.role, &m.content))
            .collect();
        messages.push(PromptMessage::new(Role::User, query_text));

        Prompt { system, messages }
    }
}
