//! OpenAI-compatible model client.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, and any service exposing a
//! `/chat/completions` endpoint with SSE streaming. Fragments are emitted as
//! `data:` deltas arrive; a `[DONE]` line (or the connection closing) ends
//! the stream. Cancellation is drop-based: when the consumer drops the
//! receiver, the first failed send stops the reader task and the underlying
//! response body is dropped with it.

use async_trait::async_trait;
use futures::StreamExt;
use groundwire_core::error::GenerationError;
use groundwire_core::message::Role;
use groundwire_core::model::{Fragment, GenerationModel, Prompt};
use groundwire_core::settings::ModelParameters;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// A client for an OpenAI-compatible chat completion endpoint.
pub struct OpenAiCompatModel {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatModel {
    /// Create a new client.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create an OpenAI client (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Create an Ollama client (convenience constructor).
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
        )
    }

    /// Convert a prompt into the wire message list: system first, then the
    /// history window and the current query.
    fn to_api_messages(prompt: &Prompt) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(prompt.messages.len() + 1);
        if !prompt.system.is_empty() {
            messages.push(ApiMessage {
                role: "system".into(),
                content: prompt.system.clone(),
            });
        }
        for msg in &prompt.messages {
            messages.push(ApiMessage {
                role: match msg.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                },
                content: msg.content.clone(),
            });
        }
        messages
    }

    fn build_body(prompt: &Prompt, params: &ModelParameters) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": params.model,
            "messages": Self::to_api_messages(prompt),
            "temperature": params.temperature,
            "stream": true,
        });
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        // Opaque pass-through parameters are merged at the top level.
        for (key, value) in &params.extra {
            body[key.as_str()] = value.clone();
        }
        body
    }
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[async_trait]
impl GenerationModel for OpenAiCompatModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_stream(
        &self,
        prompt: Prompt,
        params: &ModelParameters,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<Fragment, GenerationError>>,
        GenerationError,
    > {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&prompt, params);

        debug!(provider = %self.name, model = %params.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(GenerationError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(GenerationError::AuthenticationFailed(
                "Invalid model service API key".into(),
            ));
        }
        if status == 404 {
            return Err(GenerationError::ModelNotFound(params.model.clone()));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model service error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(GenerationError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();

                    if data == "[DONE]" {
                        return; // channel closes, signalling completion
                    }

                    let event: serde_json::Value = match serde_json::from_str(data) {
                        Ok(v) => v,
                        Err(e) => {
                            trace!(error = %e, data = %data, "Ignoring unparseable SSE line");
                            continue;
                        }
                    };

                    let delta = &event["choices"][0]["delta"];
                    let role = delta["role"].as_str().map(String::from);
                    let Some(text) = delta["content"].as_str() else {
                        continue;
                    };
                    if text.is_empty() && role.is_none() {
                        continue;
                    }

                    let fragment = Fragment {
                        role,
                        text: text.to_string(),
                    };
                    if tx.send(Ok(fragment)).await.is_err() {
                        // Consumer cancelled — stop reading the wire.
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}
