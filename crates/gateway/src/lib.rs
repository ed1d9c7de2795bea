//! HTTP gateway — the surface the chat UI consumes.
//!
//! Endpoints:
//!
//! - `POST /v1/threads/{id}/turns`    — Run a turn, stream events over SSE
//! - `GET  /v1/threads/{id}/messages` — A thread's full message history
//! - `GET  /v1/threads`               — List known thread ids
//! - `GET  /health`                   — Liveness probe
//!
//! The SSE stream carries the orchestrator's turn events verbatim: `delta`
//! events for incremental render, then exactly one `done` or `error`. When
//! the client disconnects mid-stream the turn is cancelled — dropping the
//! event stream is the cancellation signal.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use futures::StreamExt;
use groundwire_core::error::Error;
use groundwire_core::message::{Message, ThreadId};
use groundwire_engine::Orchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the gateway router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/threads", get(list_threads_handler))
        .route("/v1/threads/{id}/turns", post(turn_handler))
        .route("/v1/threads/{id}/messages", get(history_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: SharedState, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, router(state)).await
}

// ── Request / response bodies ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TurnRequest {
    query: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct ThreadsBody {
    threads: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HistoryBody {
    thread_id: String,
    messages: Vec<Message>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_threads_handler(State(state): State<SharedState>) -> Json<ThreadsBody> {
    let threads = state
        .orchestrator
        .registry()
        .thread_ids()
        .await
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    Json(ThreadsBody { threads })
}

async fn turn_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<TurnRequest>,
) -> Response {
    let thread_id = ThreadId::from(&id);

    match state.orchestrator.submit_turn(&thread_id, &body.query).await {
        Ok(stream) => {
            let sse_stream = stream.map(|event| {
                SseEvent::default()
                    .event(event.event_type())
                    .json_data(&event)
            });
            Sse::new(sse_stream).into_response()
        }
        Err(err) => {
            let status = match err {
                Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                Json(ErrorBody {
                    error: err.user_message(),
                }),
            )
                .into_response()
        }
    }
}

async fn history_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    let thread_id = ThreadId::from(&id);
    match state.orchestrator.history(&thread_id).await {
        Some(messages) => Json(HistoryBody {
            thread_id: id,
            messages,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: format!("Unknown thread: {id}"),
            }),
        )
            .into_response(),
    }
}
