//! Message and ConversationThread domain types.
//!
//! These are the value objects at the heart of the pipeline: a user Message
//! enters a thread, the orchestrator runs a turn, and exactly one assistant
//! Message is appended once generation completes. The message log is
//! append-only — no edit or delete operation exists, deliberately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::ThreadConfig;

/// Unique identifier for a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The pipeline's generated answer
    Assistant,
}

/// A single message in a conversation thread. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// True when a generation failure cut the answer short and the partial
    /// text was committed anyway.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub incomplete: bool,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            incomplete: false,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            incomplete: false,
        }
    }

    /// Create an assistant message flagged as cut short mid-generation.
    pub fn assistant_partial(content: impl Into<String>) -> Self {
        Self {
            incomplete: true,
            ..Self::assistant(content)
        }
    }
}

/// One conversation: an ordered, append-only message log plus the retrieval
/// and generation parameters in effect for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationThread {
    /// Unique thread ID
    pub id: ThreadId,

    /// Ordered messages, append-only
    pub messages: Vec<Message>,

    /// Effective per-thread configuration
    pub config: ThreadConfig,

    /// When this thread was created
    pub created_at: DateTime<Utc>,

    /// When the last message was appended
    pub updated_at: DateTime<Utc>,
}

impl ConversationThread {
    /// Create a new empty thread with the given configuration.
    pub fn new(id: ThreadId, config: ThreadConfig) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            config,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message. This is the only mutation the log supports.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// A read-only snapshot of the ordered message log.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("What is the refund policy?");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "What is the refund policy?");
        assert!(!msg.incomplete);
    }

    #[test]
    fn partial_assistant_message_flagged() {
        let msg = Message::assistant_partial("Refunds are available for");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.incomplete);
    }

    #[test]
    fn thread_tracks_updates() {
        let mut thread =
            ConversationThread::new(ThreadId::from("t1"), ThreadConfig::default());
        let created = thread.created_at;

        thread.push(Message::user("First message"));
        assert_eq!(thread.messages.len(), 1);
        assert!(thread.updated_at >= created);
    }

    #[test]
    fn snapshot_preserves_order() {
        let mut thread =
            ConversationThread::new(ThreadId::from("t1"), ThreadConfig::default());
        thread.push(Message::user("question"));
        thread.push(Message::assistant("answer"));

        let snap = thread.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].role, Role::User);
        assert_eq!(snap[1].role, Role::Assistant);
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "Test message");
        assert_eq!(deserialized.role, Role::User);
    }

    #[test]
    fn incomplete_flag_omitted_when_false() {
        let msg = Message::assistant("done");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("incomplete"));

        let partial = Message::assistant_partial("cut off");
        let json = serde_json::to_string(&partial).unwrap();
        assert!(json.contains(r#""incomplete":true"#));
    }
}
