//! HTTP client for llama-server's OpenAI-compatible API.

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LocalAIError;
use crate::DEFAULT_PORT;

/// Client for communicating with llama-server.
pub struct LlamaCppClient {
    client: reqwest::Client,
    base_url: String,
}

/// OpenAI-compatible chat completion request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: i32,
    stream: bool,
}

/// Chat message in OpenAI format.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// One server-sent event payload of a streamed completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

impl LlamaCppClient {
    /// Create a new client with default URL (localhost:11436).
    pub fn new() -> Self {
        Self::with_port(DEFAULT_PORT)
    }

    /// Create a new client with a custom URL.
    pub fn with_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create a new client with a custom port on localhost.
    pub fn with_port(port: u16) -> Self {
        Self::with_url(format!("http://127.0.0.1:{}", port))
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server is running and healthy.
    pub async fn check_health(&self) -> Result<(), LocalAIError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    LocalAIError::ServerNotRunning(self.base_url.clone())
                } else {
                    LocalAIError::Http(e)
                }
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LocalAIError::ServerNotRunning(self.base_url.clone()))
        }
    }

    /// Stream a chat completion, calling `on_token` for every content delta.
    ///
    /// Uses `/v1/chat/completions` with `stream: true` and reads the
    /// server-sent events until `data: [DONE]` or the body ends.
    pub async fn complete_stream(
        &self,
        prompt: &str,
        max_tokens: i32,
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Result<(), LocalAIError> {
        let request = ChatCompletionRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            max_tokens,
            stream: true,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LocalAIError::ServerNotRunning(self.base_url.clone())
                } else {
                    LocalAIError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LocalAIError::Api(format!("{}: {}", status, text)));
        }

        let mut body = response.bytes_stream();
        // Raw bytes: a multi-byte character may straddle two chunks.
        let mut pending: Vec<u8> = Vec::new();

        while let Some(bytes) = body.next().await {
            pending.extend_from_slice(&bytes?);

            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                if handle_event_line(String::from_utf8_lossy(&line).trim(), on_token)? {
                    return Ok(());
                }
            }
        }

        // A final event without a trailing newline.
        handle_event_line(String::from_utf8_lossy(&pending).trim(), on_token)?;
        Ok(())
    }
}

/// Apply one SSE line. Returns `true` once the terminating event is seen.
fn handle_event_line(
    line: &str,
    on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
) -> Result<bool, LocalAIError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(false);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        debug!("llama-server stream finished");
        return Ok(true);
    }
    if data.is_empty() {
        return Ok(false);
    }

    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;
    for choice in chunk.choices {
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            on_token(&content);
        }
    }
    Ok(false)
}

impl Default for LlamaCppClient {
    fn default() -> Self {
        Self::new()
    }
}
