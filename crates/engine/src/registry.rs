//! The process-wide thread registry.
//!
//! The registry is the only shared mutable structure in the pipeline. Each
//! thread_id maps to an entry created on first reference (`Uninitialized →
//! Active`); entries live for the process lifetime unless explicitly
//! evicted. Eviction policy is a collaborator's decision — the registry
//! exposes `evict` and nothing more.
//!
//! Per-thread turn serialization lives here: every entry carries an async
//! mutex that the orchestrator holds for the duration of a turn, so two
//! turns on the same thread queue rather than interleave. Distinct threads
//! are fully independent.

use std::collections::HashMap;
use std::sync::Arc;

use groundwire_core::message::{ConversationThread, Message, ThreadId};
use groundwire_core::settings::ThreadConfig;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

/// One registered conversation thread.
pub struct ThreadEntry {
    /// The thread's identity.
    pub id: ThreadId,

    /// Effective configuration, fixed at creation.
    pub config: ThreadConfig,

    /// The append-only message log.
    state: RwLock<ConversationThread>,

    /// Held for the duration of a turn; queues concurrent turns.
    turn_lock: Mutex<()>,
}

impl ThreadEntry {
    fn new(id: ThreadId, config: ThreadConfig) -> Self {
        let state = ConversationThread::new(id.clone(), config.clone());
        Self {
            id,
            config,
            state: RwLock::new(state),
            turn_lock: Mutex::new(()),
        }
    }

    /// Append a message to the log. The only mutation the entry supports.
    pub async fn append(&self, message: Message) {
        self.state.write().await.push(message);
    }

    /// A read-only snapshot of the ordered message log.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.state.read().await.snapshot()
    }

    /// Number of messages in the log.
    pub async fn len(&self) -> usize {
        self.state.read().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Acquire the turn lock, queueing behind any in-flight turn.
    pub(crate) async fn lock_turn(&self) -> MutexGuard<'_, ()> {
        self.turn_lock.lock().await
    }
}

/// Process-wide registry of conversation threads, keyed by thread_id.
///
/// Inject this as a dependency rather than reaching for a global — tests
/// get isolated registries for free.
pub struct ThreadRegistry {
    threads: RwLock<HashMap<ThreadId, Arc<ThreadEntry>>>,
    defaults: ThreadConfig,
    overrides: HashMap<String, ThreadConfig>,
}

impl ThreadRegistry {
    /// Create a registry whose new threads use the given defaults.
    pub fn new(defaults: ThreadConfig) -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
            defaults,
            overrides: HashMap::new(),
        }
    }

    /// Preload a per-thread configuration, applied when that thread_id is
    /// first referenced.
    pub fn with_thread_config(mut self, thread_id: impl Into<String>, config: ThreadConfig) -> Self {
        self.overrides.insert(thread_id.into(), config);
        self
    }

    /// Get the entry for a thread, creating an empty Active thread on first
    /// reference.
    pub async fn get_or_create(&self, thread_id: &ThreadId) -> Arc<ThreadEntry> {
        if let Some(entry) = self.threads.read().await.get(thread_id) {
            return entry.clone();
        }

        let mut threads = self.threads.write().await;
        // Double-check: another task may have created it between locks.
        if let Some(entry) = threads.get(thread_id) {
            return entry.clone();
        }

        let config = self
            .overrides
            .get(&thread_id.0)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone());

        info!(thread_id = %thread_id, "Creating thread");
        let entry = Arc::new(ThreadEntry::new(thread_id.clone(), config));
        threads.insert(thread_id.clone(), entry.clone());
        entry
    }

    /// Look up a thread without creating it.
    pub async fn get(&self, thread_id: &ThreadId) -> Option<Arc<ThreadEntry>> {
        self.threads.read().await.get(thread_id).cloned()
    }

    /// Remove a thread. This is the seam an external eviction policy calls;
    /// the registry itself never expires anything.
    pub async fn evict(&self, thread_id: &ThreadId) -> bool {
        let removed = self.threads.write().await.remove(thread_id).is_some();
        if removed {
            debug!(thread_id = %thread_id, "Evicted thread");
        }
        removed
    }

    /// All registered thread ids.
    pub async fn thread_ids(&self) -> Vec<ThreadId> {
        self.threads.read().await.keys().cloned().collect()
    }

    /// Number of registered threads.
    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_reference_creates_empty_thread() {
        let registry = ThreadRegistry::new(ThreadConfig::default());
        let id = ThreadId::from("t1");

        assert!(registry.get(&id).await.is_none());
        let entry = registry.get_or_create(&id).await;
        assert!(entry.is_empty().await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn same_id_returns_same_entry() {
        let registry = ThreadRegistry::new(ThreadConfig::default());
        let id = ThreadId::from("t1");

        let a = registry.get_or_create(&id).await;
        a.append(Message::user("hello")).await;

        let b = registry.get_or_create(&id).await;
        assert_eq!(b.len().await, 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn preloaded_config_applies_on_creation() {
        let custom = ThreadConfig {
            top_k: 3,
            ..ThreadConfig::default()
        };
        let registry =
            ThreadRegistry::new(ThreadConfig::default()).with_thread_config("support", custom);

        let entry = registry.get_or_create(&ThreadId::from("support")).await;
        assert_eq!(entry.config.top_k, 3);

        let other = registry.get_or_create(&ThreadId::from("other")).await;
        assert_eq!(other.config.top_k, 10);
    }

    #[tokio::test]
    async fn evict_removes_thread() {
        let registry = ThreadRegistry::new(ThreadConfig::default());
        let id = ThreadId::from("t1");
        registry.get_or_create(&id).await;

        assert!(registry.evict(&id).await);
        assert!(registry.get(&id).await.is_none());
        assert!(!registry.evict(&id).await);
    }

    #[tokio::test]
    async fn snapshot_is_ordered() {
        let registry = ThreadRegistry::new(ThreadConfig::default());
        let entry = registry.get_or_create(&ThreadId::from("t1")).await;

        entry.append(Message::user("one")).await;
        entry.append(Message::assistant("two")).await;

        let snap = entry.snapshot().await;
        assert_eq!(snap[0].content, "one");
        assert_eq!(snap[1].content, "two");
    }

    #[tokio::test]
    async fn turn_lock_serializes() {
        let registry = ThreadRegistry::new(ThreadConfig::default());
        let entry = registry.get_or_create(&ThreadId::from("t1")).await;

        let guard = entry.lock_turn().await;
        // A second lock attempt must not succeed while the first is held.
        let second = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            entry.lock_turn(),
        )
        .await;
        assert!(second.is_err());
        drop(guard);

        // After release it proceeds.
        let _third = entry.lock_turn().await;
    }
}
