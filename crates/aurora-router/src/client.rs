//! Anthropic Messages API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Single-shot completion against a cloud model.
#[async_trait]
pub trait CloudInferenceEngine: Send + Sync {
    /// Request one complete response from `backend_model_name`.
    async fn complete_raw(
        &self,
        backend_model_name: &str,
        system: Option<&str>,
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, CloudError>;
}

/// Errors from a cloud engine.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Anthropic API failed: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing API key - set ANTHROPIC_API_KEY environment variable")]
    MissingApiKey,
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

/// Claude API client.
pub struct ClaudeClient {
    client: reqwest::Client,
    base_url: String,
    has_key: bool,
}

/// Request to Claude API.
#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from Claude API.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Error response from Claude API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl ClaudeClient {
    /// Create a new Claude client against `base_url` (e.g. `https://api.anthropic.com/v1`).
    ///
    /// An empty `api_key` is accepted; every call then fails with
    /// [`CloudError::MissingApiKey`] without touching the network.
    pub fn new(api_key: &str, base_url: impl Into<String>) -> Result<Self, CloudError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !api_key.is_empty() {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            has_key: !api_key.is_empty(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CloudInferenceEngine for ClaudeClient {
    async fn complete_raw(
        &self,
        backend_model_name: &str,
        system: Option<&str>,
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, CloudError> {
        if !self.has_key {
            return Err(CloudError::MissingApiKey);
        }

        let request = ClaudeRequest {
            model: backend_model_name,
            max_tokens: max_output_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            system,
        };

        debug!("Calling {} ({} max tokens)", backend_model_name, max_output_tokens);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CloudError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: ClaudeResponse = response.json().await?;

        // Extract text from response
        let text = response
            .content
            .iter()
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_missing_api_key_fails_calls_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = ClaudeClient::new("", server.uri()).unwrap();
        let result = client.complete_raw("claude-3-5-haiku-20241022", None, "hi", 150).await;
        assert!(matches!(result, Err(CloudError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_complete_sends_headers_and_joins_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-3-5-haiku-20241022",
                "max_tokens": 150,
                "messages": [{ "role": "user", "content": "hi" }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    { "type": "text", "text": "Hello " },
                    { "type": "text", "text": "there" }
                ],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ClaudeClient::new("sk-test", server.uri()).unwrap();
        let text = client
            .complete_raw("claude-3-5-haiku-20241022", None, "hi", 150)
            .await
            .unwrap();
        assert_eq!(text, "Hello there");
    }

    #[tokio::test]
    async fn test_error_status_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&server)
            .await;

        let client = ClaudeClient::new("sk-test", server.uri()).unwrap();
        let err = client
            .complete_raw("claude-sonnet-4-20250514", Some("be brief"), "hi", 512)
            .await
            .unwrap_err();

        match err {
            CloudError::Api { status, message } => {
                assert_eq!(status, 529);
                assert_eq!(message, "Overloaded");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_with_plain_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = ClaudeClient::new("sk-test", server.uri()).unwrap();
        let err = client
            .complete_raw("claude-3-5-haiku-20241022", None, "hi", 16)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Anthropic API failed: 502 - bad gateway");
    }
}
