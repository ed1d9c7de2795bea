//! Generation invocation — a thin adapter over the model-service contract.
//!
//! One outbound call per invocation. The returned `FragmentStream` is
//! finite and not restartable; dropping it propagates cancellation to the
//! model client, whose next send fails and stops its wire reader.

use std::sync::Arc;

use groundwire_core::error::GenerationError;
use groundwire_core::model::{Fragment, GenerationModel, Prompt};
use groundwire_core::settings::ModelParameters;
use tokio::sync::mpsc;

/// Submits prompts to the model service and exposes the fragment stream.
pub struct GenerationInvoker {
    model: Arc<dyn GenerationModel>,
}

impl GenerationInvoker {
    pub fn new(model: Arc<dyn GenerationModel>) -> Self {
        Self { model }
    }

    /// Start one generation. Errors here are pre-stream failures; mid-stream
    /// failures arrive as `Err` items on the returned stream.
    pub async fn invoke(
        &self,
        prompt: Prompt,
        params: &ModelParameters,
    ) -> Result<FragmentStream, GenerationError> {
        let receiver = self.model.generate_stream(prompt, params).await?;
        Ok(FragmentStream { receiver })
    }
}

/// A cancellable, finite sequence of response fragments.
///
/// The stream ends (`next` returns `None`) when the model signals
/// completion. Dropping the stream is cancellation.
pub struct FragmentStream {
    receiver: mpsc::Receiver<Result<Fragment, GenerationError>>,
}

impl FragmentStream {
    /// Pull the next fragment, suspending on network I/O as needed.
    pub async fn next(&mut self) -> Option<Result<Fragment, GenerationError>> {
        self.receiver.recv().await
    }

    /// Explicitly stop the stream; further fragments are discarded and the
    /// producer's sends start failing.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A model that streams its script one fragment at a time.
    struct ScriptedModel {
        fragments: Vec<String>,
    }

    #[async_trait::async_trait]
    impl GenerationModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_stream(
            &self,
            _prompt: Prompt,
            _params: &ModelParameters,
        ) -> Result<mpsc::Receiver<Result<Fragment, GenerationError>>, GenerationError> {
            let (tx, rx) = mpsc::channel(8);
            let fragments = self.fragments.clone();
            tokio::spawn(async move {
                for text in fragments {
                    if tx.send(Ok(Fragment::text(text))).await.is_err() {
                        return;
                    }
                }
            });
            Ok(rx)
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            system: String::new(),
            messages: vec![],
        }
    }

    #[tokio::test]
    async fn stream_yields_fragments_then_ends() {
        let invoker = GenerationInvoker::new(Arc::new(ScriptedModel {
            fragments: vec!["Hel".into(), "lo".into()],
        }));

        let mut stream = invoker
            .invoke(prompt(), &ModelParameters::default())
            .await
            .unwrap();

        let mut collected = String::new();
        while let Some(result) = stream.next().await {
            collected.push_str(&result.unwrap().text);
        }
        assert_eq!(collected, "Hello");
    }

    #[tokio::test]
    async fn close_stops_emission() {
        let invoker = GenerationInvoker::new(Arc::new(ScriptedModel {
            fragments: (0..100).map(|i| format!("frag{i}")).collect(),
        }));

        let mut stream = invoker
            .invoke(prompt(), &ModelParameters::default())
            .await
            .unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text, "frag0");
        stream.close();

        // Drain whatever was already buffered; the channel must end.
        let mut drained = 0;
        while stream.next().await.is_some() {
            drained += 1;
        }
        assert!(drained < 100);
    }
}
