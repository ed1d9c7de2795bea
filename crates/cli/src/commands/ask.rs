//! `groundwire ask` — run one turn and stream the answer to stdout.

use std::io::Write as _;
use std::path::Path;

use anyhow::{Context as _, bail};
use groundwire_config::AppConfig;
use groundwire_core::message::ThreadId;
use groundwire_engine::TurnEvent;
use groundwire_stores::InMemoryStore;
use tracing::debug;

use crate::wiring;

pub async fn run(
    config: AppConfig,
    query: &str,
    thread: &str,
    corpus: Option<&Path>,
) -> anyhow::Result<()> {
    let (orchestrator, seedable) = wiring::build_orchestrator(&config);

    if let Some(dir) = corpus {
        let Some(store) = &seedable else {
            bail!("--corpus only applies to the in_memory store backend");
        };
        let count = seed_corpus(store, dir).await?;
        debug!(count, dir = %dir.display(), "Seeded corpus");
    }

    let thread_id = ThreadId::from(thread);
    let mut stream = orchestrator.submit_turn(&thread_id, query).await?;

    let mut stdout = std::io::stdout();
    while let Some(event) = stream.next().await {
        match event {
            TurnEvent::Delta { text } => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            TurnEvent::Done { .. } => {
                stdout.write_all(b"\n")?;
            }
            TurnEvent::Error { message } => {
                stdout.write_all(b"\n")?;
                bail!("{message}");
            }
        }
    }

    Ok(())
}

/// Load every *.txt / *.md file in `dir` as one document each.
async fn seed_corpus(store: &InMemoryStore, dir: &Path) -> anyhow::Result<usize> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read corpus directory {}", dir.display()))?;

    let mut count = 0;
    for entry in entries {
        let path = entry?.path();
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "txt" | "md"));
        if !is_text {
            continue;
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from);
        store.add(content, source).await;
        count += 1;
    }

    Ok(count)
}
