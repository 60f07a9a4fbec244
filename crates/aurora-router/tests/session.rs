//! End-to-end chat turns against mocked selection and Anthropic services.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aurora_router::{
    ChatSession, ClaudeClient, DecisionSource, Dispatcher, LocalAIError, LocalInferenceEngine,
    ModelCatalog, Role, Router, RouterConfig, ERROR_RATIONALE,
};

struct EchoEngine;

#[async_trait]
impl LocalInferenceEngine for EchoEngine {
    fn is_ready(&self) -> bool {
        true
    }

    async fn download(
        &self,
        _on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<(), LocalAIError> {
        Ok(())
    }

    async fn complete(
        &self,
        prompt: &str,
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Result<(), LocalAIError> {
        on_token("echo: ");
        on_token(prompt);
        Ok(())
    }
}

fn anthropic_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }]
    }))
}

fn session(selection: &MockServer, anthropic: &MockServer) -> ChatSession {
    let config = RouterConfig::builder()
        .anthropic_api_key("sk-test")
        .anthropic_url(anthropic.uri())
        .selection_api_key("apk-test")
        .selection_url(selection.uri())
        .router_model("router-model")
        .chunk_delay(Duration::ZERO)
        .thinking_floor(Duration::ZERO)
        .build();

    let cloud = Arc::new(ClaudeClient::new(&config.anthropic_api_key, &config.anthropic_url).unwrap());
    let router = Router::from_config(&config, Arc::new(ModelCatalog::aurora()), cloud.clone());
    let dispatcher =
        Dispatcher::from_config(cloud, &config).with_local_engine("qwen3-0.6", Arc::new(EchoEngine));

    ChatSession::from_config(&config, Arc::new(router), Arc::new(dispatcher))
}

#[tokio::test]
async fn test_primary_selection_answered_by_cloud() {
    let selection = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/select-model"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "selected_model": { "model_name": "anthropic/claude-opus-4-20250514" }
        })))
        .expect(1)
        .mount(&selection)
        .await;

    let anthropic = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(serde_json::json!({
            "model": "claude-sonnet-4-20250514"
        })))
        .respond_with(anthropic_reply("<think>plan</think>Energy is quantized."))
        .expect(1)
        .mount(&anthropic)
        .await;

    let session = session(&selection, &anthropic);
    let decision = session
        .submit("Explain the Schrödinger equation")
        .await
        .unwrap();

    assert_eq!(decision.source(), DecisionSource::PrimaryClassifier);
    assert_eq!(decision.model_id(), "claude-opus-4");

    let conversation = session.snapshot();
    let turns = conversation.turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role(), Role::Assistant);
    assert_eq!(turns[1].text(), "Energy is quantized.");
    assert_eq!(
        turns[1].rationale(),
        Some("🧠 Complex Reasoning • Adaptive Router • Opus 4")
    );
    assert!(!turns[1].is_streaming());
}

#[tokio::test]
async fn test_fallback_routes_to_local_engine() {
    let selection = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/select-model"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&selection)
        .await;

    let anthropic = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(body_partial_json(serde_json::json!({ "model": "router-model" })))
        .respond_with(anthropic_reply(
            "Here you go: {\"model\": \"qwen3-0.6\", \"reason\": \"Simple greeting\"}",
        ))
        .expect(1)
        .mount(&anthropic)
        .await;

    let session = session(&selection, &anthropic);
    let decision = session.submit("hello").await.unwrap();

    assert_eq!(decision.source(), DecisionSource::FallbackClassifier);
    let conversation = session.snapshot();
    let reply = &conversation.turns()[1];
    assert_eq!(reply.text(), "echo: hello");
    assert_eq!(reply.rationale(), Some("📱 Simple greeting • Qwen 3"));
}

#[tokio::test]
async fn test_cloud_outage_becomes_error_turn() {
    let selection = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/select-model"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&selection)
        .await;

    let anthropic = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(serde_json::json!({
            "type": "error",
            "error": { "type": "overloaded_error", "message": "Overloaded" }
        })))
        .mount(&anthropic)
        .await;

    let session = session(&selection, &anthropic);
    let decision = session.submit("hello").await.unwrap();

    assert_eq!(decision.source(), DecisionSource::DefaultFallback);
    let conversation = session.snapshot();
    let notice = conversation.turns().last().unwrap();
    assert_eq!(notice.rationale(), Some(ERROR_RATIONALE));
    assert_eq!(
        notice.text(),
        "Sorry, I encountered an error: Anthropic API failed: 529 - Overloaded. Please try again."
    );
}
