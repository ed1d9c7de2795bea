//! The orchestrator — one full turn, from query to committed answer.
//!
//! A turn walks `Retrieving → Assembling → Prompting → Generating →
//! Committing` in strict sequence; each stage feeds the next and no stage
//! retries automatically. The user message is appended *before* retrieval so
//! history reflects the query even when a later stage fails; the assistant
//! message is appended only after every fragment has been consumed, so the
//! append-only log never holds ragged entries. Incremental display is the
//! caller's concern, operating on the live event stream.
//!
//! Failure policy:
//! - retrieval failure or timeout aborts the turn; the thread keeps only the
//!   user message, so a user retry re-attempts cleanly
//! - a mid-stream generation failure commits the partial answer flagged
//!   incomplete (when there is one) and surfaces the error
//! - cancellation commits nothing and leaves the thread valid for the next
//!   turn

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use groundwire_core::error::{Error, Result, TurnStage};
use groundwire_core::message::{Message, ThreadId};
use groundwire_core::model::GenerationModel;
use groundwire_core::retrieval::{Query, VectorStore};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::context::ContextAssembler;
use crate::invoker::GenerationInvoker;
use crate::prompt::PromptBuilder;
use crate::registry::{ThreadEntry, ThreadRegistry};
use crate::retriever::Retriever;

/// Events emitted to the consumer over the course of one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Partial answer text from the model.
    Delta { text: String },

    /// The turn committed successfully.
    Done {
        thread_id: String,
        message_id: String,
    },

    /// The turn failed; `message` is safe to show the user.
    Error { message: String },
}

impl TurnEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Delta { .. } => "delta",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// The live event stream for one in-flight turn.
///
/// Dropping the stream cancels the turn; `cancel` does so explicitly.
/// Either way the turn task stops emitting within one scheduling step and
/// commits nothing.
#[derive(Debug)]
pub struct TurnStream {
    events: mpsc::Receiver<TurnEvent>,
    cancel: Option<oneshot::Sender<()>>,
}

impl TurnStream {
    /// Pull the next event; `None` once the turn has finished.
    pub async fn next(&mut self) -> Option<TurnEvent> {
        self.events.recv().await
    }

    /// Abort the turn. Partial output already emitted is not retracted.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }
}

impl futures::Stream for TurnStream {
    type Item = TurnEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<TurnEvent>> {
        self.events.poll_recv(cx)
    }
}

/// Drives turns across all threads. One orchestrator per process, holding
/// the registry and the two external collaborators.
pub struct Orchestrator {
    registry: Arc<ThreadRegistry>,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn GenerationModel>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ThreadRegistry>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn GenerationModel>,
    ) -> Self {
        Self {
            registry,
            store,
            model,
        }
    }

    /// The thread registry, for history access and external eviction.
    pub fn registry(&self) -> &Arc<ThreadRegistry> {
        &self.registry
    }

    /// A thread's full message history, for initial render / reload.
    pub async fn history(&self, thread_id: &ThreadId) -> Option<Vec<Message>> {
        match self.registry.get(thread_id).await {
            Some(entry) => Some(entry.snapshot().await),
            None => None,
        }
    }

    /// Run one turn, returning the live event stream.
    ///
    /// Query validation happens here, before anything is appended — an
    /// invalid query leaves no trace on the thread. Turns for the same
    /// thread_id queue behind each other; distinct threads run in parallel.
    pub async fn submit_turn(&self, thread_id: &ThreadId, query_text: &str) -> Result<TurnStream> {
        if query_text.trim().is_empty() {
            return Err(Error::InvalidInput("Query must not be empty".into()));
        }

        let entry = self.registry.get_or_create(thread_id).await;
        let (tx, rx) = mpsc::channel(64);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        tokio::spawn(run_turn(
            entry,
            query_text.to_string(),
            self.store.clone(),
            self.model.clone(),
            tx,
            cancel_rx,
        ));

        Ok(TurnStream {
            events: rx,
            cancel: Some(cancel_tx),
        })
    }
}

async fn run_turn(
    entry: Arc<ThreadEntry>,
    query_text: String,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn GenerationModel>,
    tx: mpsc::Sender<TurnEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    // Serialize against other turns on this thread. Queued, not rejected.
    let _turn = entry.lock_turn().await;

    let config = entry.config.clone();
    let thread_id = entry.id.clone();
    let deadline = Instant::now() + Duration::from_secs(config.timeout_secs);

    info!(thread_id = %thread_id, "Turn started");

    // History snapshot excludes the query we are about to append; the
    // prompt builder adds the query itself as the final message.
    let history = entry.snapshot().await;
    entry.append(Message::user(&query_text)).await;

    // ── Retrieving ──
    debug!(thread_id = %thread_id, stage = %TurnStage::Retrieving, "Stage entered");
    let retriever = Retriever::new(store);
    let query = Query::new(&query_text);
    let passages = match timeout_at(deadline, retriever.retrieve(&query, config.top_k)).await {
        Err(_) => {
            abort_turn(
                &tx,
                &thread_id,
                Error::Timeout {
                    stage: TurnStage::Retrieving,
                    budget_secs: config.timeout_secs,
                },
            )
            .await;
            return;
        }
        Ok(Err(err)) => {
            abort_turn(&tx, &thread_id, err).await;
            return;
        }
        Ok(Ok(passages)) => passages,
    };

    // ── Assembling ──
    debug!(thread_id = %thread_id, stage = %TurnStage::Assembling, passages = passages.len(), "Stage entered");
    let block = match ContextAssembler::new(config.max_context_chars).assemble(&passages) {
        Ok(block) => block,
        Err(err) => {
            abort_turn(&tx, &thread_id, err).await;
            return;
        }
    };

    // ── Prompting ──
    debug!(thread_id = %thread_id, stage = %TurnStage::Prompting, context_chars = block.len_chars(), "Stage entered");
    let prompt = PromptBuilder::new(config.history_window).build(&block, &history, &query_text);

    // ── Generating ──
    debug!(thread_id = %thread_id, stage = %TurnStage::Generating, "Stage entered");
    let invoker = GenerationInvoker::new(model);
    let mut stream = match timeout_at(deadline, invoker.invoke(prompt, &config.model)).await {
        Err(_) => {
            abort_turn(
                &tx,
                &thread_id,
                Error::Timeout {
                    stage: TurnStage::Generating,
                    budget_secs: config.timeout_secs,
                },
            )
            .await;
            return;
        }
        Ok(Err(source)) => {
            abort_turn(
                &tx,
                &thread_id,
                Error::Generation {
                    source,
                    partial: None,
                },
            )
            .await;
            return;
        }
        Ok(Ok(stream)) => stream,
    };

    let mut answer = String::new();
    let mut failure: Option<Error> = None;

    loop {
        tokio::select! {
            _ = &mut cancel_rx => {
                // Cancelled, or the consumer went away entirely. Stop
                // emitting, commit nothing; the thread stays valid.
                debug!(thread_id = %thread_id, "Turn cancelled mid-stream");
                return;
            }
            next = timeout_at(deadline, stream.next()) => match next {
                Err(_) => {
                    failure = Some(Error::Timeout {
                        stage: TurnStage::Generating,
                        budget_secs: config.timeout_secs,
                    });
                    break;
                }
                Ok(None) => break, // model signalled completion
                Ok(Some(Ok(fragment))) => {
                    answer.push_str(&fragment.text);
                    if tx.send(TurnEvent::Delta { text: fragment.text }).await.is_err() {
                        debug!(thread_id = %thread_id, "Consumer dropped, abandoning turn");
                        return;
                    }
                }
                Ok(Some(Err(source))) => {
                    failure = Some(Error::Generation {
                        source,
                        partial: Some(answer.clone()),
                    });
                    break;
                }
            }
        }
    }

    // ── Committing ──
    debug!(thread_id = %thread_id, stage = %TurnStage::Committing, "Stage entered");
    match failure {
        None => {
            let message = Message::assistant(answer);
            let message_id = message.id.clone();
            entry.append(message).await;
            info!(thread_id = %thread_id, "Turn committed");
            let _ = tx
                .send(TurnEvent::Done {
                    thread_id: thread_id.to_string(),
                    message_id,
                })
                .await;
        }
        Some(err) => {
            // Keep the partial answer the user already saw, flagged so the
            // record is honest about being cut short.
            if !answer.is_empty() {
                entry.append(Message::assistant_partial(answer)).await;
                info!(thread_id = %thread_id, "Partial answer committed after failure");
            }
            warn!(thread_id = %thread_id, error = %err, "Turn failed during generation");
            let _ = tx
                .send(TurnEvent::Error {
                    message: err.user_message(),
                })
                .await;
        }
    }
}

/// Abort before generation produced anything: surface the error and leave
/// the thread with only the user message.
async fn abort_turn(tx: &mpsc::Sender<TurnEvent>, thread_id: &ThreadId, err: Error) {
    warn!(thread_id = %thread_id, error = %err, "Turn aborted");
    let _ = tx
        .send(TurnEvent::Error {
            message: err.user_message(),
        })
        .await;
}
