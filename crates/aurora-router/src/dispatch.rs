//! Executes a routing decision against the local or cloud engine.
//!
//! Both engines end up behind the same [`TokenSink`] contract: tokens in
//! order, then exactly one `on_complete`, whatever happened in between.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use aurora_local_ai::LocalInferenceEngine;

use crate::catalog::CapabilityClass;
use crate::client::{CloudError, CloudInferenceEngine};
use crate::config::RouterConfig;
use crate::decision::RoutingDecision;
use crate::stream::{replay_words, strip_thinking, TokenSink};

/// System instruction for cloud answers.
pub const ANSWER_SYSTEM_PROMPT: &str =
    "Answer directly. Do not use <think> tags or thinking blocks. No internal reasoning - just respond.";

/// Substitute answer when on-device inference fails.
pub const LOCAL_FAILURE_MESSAGE: &str =
    "⚠️ Local model error. The local model encountered an issue. Please try again.";

/// Errors surfaced to the caller of [`Dispatcher::dispatch`].
///
/// Only cloud failures escape; local failures become substitute answers.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Cloud(#[from] CloudError),
}

/// Degraded-mode answer for a local model that is not on the device.
pub fn not_downloaded_message(display_name: &str) -> String {
    format!(
        "⚠️ The local model \"{}\" is not downloaded yet. Please download it first, \
         or try asking again and I'll route to a cloud model.",
        display_name
    )
}

/// Runs prompts on the engine a decision names.
pub struct Dispatcher {
    local: HashMap<String, Arc<dyn LocalInferenceEngine>>,
    cloud: Arc<dyn CloudInferenceEngine>,
    max_output_tokens: u32,
    chunk_delay: Duration,
}

impl Dispatcher {
    pub fn new(cloud: Arc<dyn CloudInferenceEngine>) -> Self {
        let defaults = RouterConfig::default();
        Self {
            local: HashMap::new(),
            cloud,
            max_output_tokens: defaults.answer_max_tokens,
            chunk_delay: defaults.chunk_delay,
        }
    }

    pub fn from_config(cloud: Arc<dyn CloudInferenceEngine>, config: &RouterConfig) -> Self {
        Self {
            max_output_tokens: config.answer_max_tokens,
            chunk_delay: config.chunk_delay,
            ..Self::new(cloud)
        }
    }

    /// Register the engine that serves a local catalog model.
    pub fn with_local_engine(
        mut self,
        model_id: impl Into<String>,
        engine: Arc<dyn LocalInferenceEngine>,
    ) -> Self {
        self.local.insert(model_id.into(), engine);
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = tokens;
        self
    }

    /// Engine registered for a local model id.
    pub fn local_engine(&self, model_id: &str) -> Option<&Arc<dyn LocalInferenceEngine>> {
        self.local.get(model_id)
    }

    /// Answer `prompt` with the decided model, streaming into `sink`.
    ///
    /// `sink.on_complete()` is called exactly once, after every token, even
    /// when a cloud error is returned.
    pub async fn dispatch(
        &self,
        prompt: &str,
        decision: &RoutingDecision,
        sink: &mut dyn TokenSink,
    ) -> Result<(), DispatchError> {
        let result = match decision.capability() {
            CapabilityClass::Local => {
                self.dispatch_local(prompt, decision, sink).await;
                Ok(())
            }
            CapabilityClass::Cloud => self.dispatch_cloud(prompt, decision, sink).await,
        };
        sink.on_complete();
        result
    }

    async fn dispatch_local(
        &self,
        prompt: &str,
        decision: &RoutingDecision,
        sink: &mut dyn TokenSink,
    ) {
        let engine = match self.local.get(decision.model_id()) {
            Some(engine) if engine.is_ready() => engine,
            _ => {
                info!("Local model '{}' is not downloaded", decision.model_id());
                sink.on_token(&not_downloaded_message(decision.display_name()));
                return;
            }
        };

        info!("Running '{}' on device", decision.model_id());
        let mut emitted = false;
        let outcome = {
            let mut forward = |token: &str| {
                emitted = true;
                sink.on_token(token);
            };
            engine.complete(prompt, &mut forward).await
        };

        if let Err(e) = outcome {
            warn!("Local model '{}' failed: {}", decision.model_id(), e);
            if emitted {
                sink.on_token(&format!("\n\n{}", LOCAL_FAILURE_MESSAGE));
            } else {
                sink.on_token(LOCAL_FAILURE_MESSAGE);
            }
        }
    }

    async fn dispatch_cloud(
        &self,
        prompt: &str,
        decision: &RoutingDecision,
        sink: &mut dyn TokenSink,
    ) -> Result<(), DispatchError> {
        info!("Calling cloud model {}", decision.backend_model_name());
        let raw = self
            .cloud
            .complete_raw(
                decision.backend_model_name(),
                Some(ANSWER_SYSTEM_PROMPT),
                prompt,
                self.max_output_tokens,
            )
            .await?;

        let cleaned = strip_thinking(&raw);
        debug!(
            "Cloud reply: {} chars raw, {} after cleanup",
            raw.len(),
            cleaned.len()
        );
        replay_words(&cleaned, self.chunk_delay, sink).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModelCatalog;
    use crate::decision::DecisionSource;
    use crate::testing::{Event, Recorder, ScriptedCloud, ScriptedLocal};

    fn decision_for(id: &str) -> RoutingDecision {
        let catalog = ModelCatalog::aurora();
        RoutingDecision::new(
            catalog.get(id).unwrap(),
            "test",
            DecisionSource::FallbackClassifier,
        )
    }

    fn dispatcher(cloud: Arc<ScriptedCloud>) -> Dispatcher {
        Dispatcher::new(cloud).with_chunk_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_local_not_downloaded() {
        let local = Arc::new(ScriptedLocal::not_downloaded());
        let cloud = Arc::new(ScriptedCloud::replying("unused"));
        let dispatcher = dispatcher(cloud.clone()).with_local_engine("qwen3-0.6", local.clone());
        let mut sink = Recorder::default();

        dispatcher
            .dispatch("hi", &decision_for("qwen3-0.6"), &mut sink)
            .await
            .unwrap();

        let tokens = sink.tokens();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].contains("Qwen 3"));
        assert!(tokens[0].contains("download"));
        assert_eq!(sink.events.last(), Some(&Event::Complete));
        assert_eq!(sink.completions(), 1);
        assert_eq!(local.completions(), 0);
        assert!(cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_local_without_engine_counts_as_not_downloaded() {
        let dispatcher = dispatcher(Arc::new(ScriptedCloud::replying("unused")));
        let mut sink = Recorder::default();

        dispatcher
            .dispatch("hi", &decision_for("smollm2-360m"), &mut sink)
            .await
            .unwrap();

        assert_eq!(sink.tokens(), vec![not_downloaded_message("SmolLM2")]);
        assert_eq!(sink.completions(), 1);
    }

    #[tokio::test]
    async fn test_local_tokens_forwarded_verbatim() {
        let local = Arc::new(ScriptedLocal::ready(&["The", " answer", " is", " 4"]));
        let dispatcher = dispatcher(Arc::new(ScriptedCloud::replying("unused")))
            .with_local_engine("qwen3-0.6", local.clone());
        let mut sink = Recorder::default();

        dispatcher
            .dispatch("2+2", &decision_for("qwen3-0.6"), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.events,
            vec![
                Event::Token("The".into()),
                Event::Token(" answer".into()),
                Event::Token(" is".into()),
                Event::Token(" 4".into()),
                Event::Complete,
            ]
        );
        assert_eq!(local.completions(), 1);
    }

    #[tokio::test]
    async fn test_local_failure_is_absorbed() {
        let local = Arc::new(ScriptedLocal::crashing(&[]));
        let dispatcher = dispatcher(Arc::new(ScriptedCloud::replying("unused")))
            .with_local_engine("qwen3-0.6", local);
        let mut sink = Recorder::default();

        let result = dispatcher
            .dispatch("hi", &decision_for("qwen3-0.6"), &mut sink)
            .await;

        assert!(result.is_ok());
        assert_eq!(sink.tokens(), vec![LOCAL_FAILURE_MESSAGE.to_string()]);
        assert_eq!(sink.completions(), 1);
    }

    #[tokio::test]
    async fn test_local_failure_after_partial_output() {
        let local = Arc::new(ScriptedLocal::crashing(&["Partial"]));
        let dispatcher = dispatcher(Arc::new(ScriptedCloud::replying("unused")))
            .with_local_engine("qwen3-0.6", local);
        let mut sink = Recorder::default();

        dispatcher
            .dispatch("hi", &decision_for("qwen3-0.6"), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.tokens(),
            vec![
                "Partial".to_string(),
                format!("\n\n{}", LOCAL_FAILURE_MESSAGE)
            ]
        );
    }

    #[tokio::test]
    async fn test_cloud_strips_thinking_and_chunks_words() {
        let cloud = Arc::new(ScriptedCloud::replying("<think>internal</think>Hello world"));
        let dispatcher = dispatcher(cloud.clone());
        let mut sink = Recorder::default();

        dispatcher
            .dispatch("greet me", &decision_for("claude-opus-4"), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            sink.events,
            vec![
                Event::Token("Hello ".into()),
                Event::Token("world".into()),
                Event::Complete,
            ]
        );

        let calls = cloud.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "claude-sonnet-4-20250514");
        assert_eq!(calls[0].system.as_deref(), Some(ANSWER_SYSTEM_PROMPT));
        assert_eq!(calls[0].prompt, "greet me");
        assert_eq!(calls[0].max_tokens, 512);
    }

    #[tokio::test]
    async fn test_cloud_failure_still_completes() {
        let dispatcher = dispatcher(Arc::new(ScriptedCloud::failing(500, "internal")));
        let mut sink = Recorder::default();

        let err = dispatcher
            .dispatch("hi", &decision_for("claude-3-5-haiku"), &mut sink)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("500"));
        assert_eq!(sink.events, vec![Event::Complete]);
    }

    #[tokio::test]
    async fn test_cloud_empty_reply_completes_without_tokens() {
        let dispatcher = dispatcher(Arc::new(ScriptedCloud::replying("<think>only</think>")));
        let mut sink = Recorder::default();

        dispatcher
            .dispatch("hi", &decision_for("claude-3-5-haiku"), &mut sink)
            .await
            .unwrap();
        assert_eq!(sink.events, vec![Event::Complete]);
    }
}
