//! One chat: route, dispatch and record each prompt as conversation turns.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::RouterConfig;
use crate::conversation::{shared_conversation, Conversation, SharedConversation, StreamAggregator};
use crate::decision::RoutingDecision;
use crate::dispatch::Dispatcher;
use crate::router::Router;

/// Rationale attached to the notice shown when a prompt cannot be answered.
pub const ERROR_RATIONALE: &str = "⚠️ Error occurred during routing";

/// Text of the notice shown when a prompt cannot be answered.
pub fn error_message(detail: &str) -> String {
    format!("Sorry, I encountered an error: {}. Please try again.", detail)
}

/// Drives the turn flow for one conversation.
pub struct ChatSession {
    router: Arc<Router>,
    dispatcher: Arc<Dispatcher>,
    state: SharedConversation,
    thinking_floor: Duration,
}

impl ChatSession {
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            router,
            dispatcher,
            state: shared_conversation(),
            thinking_floor: Duration::ZERO,
        }
    }

    pub fn from_config(
        config: &RouterConfig,
        router: Arc<Router>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self::new(router, dispatcher).with_thinking_floor(config.thinking_floor)
    }

    /// Minimum time spent in the routing step. Zero disables the floor.
    pub fn with_thinking_floor(mut self, floor: Duration) -> Self {
        self.thinking_floor = floor;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Receive a snapshot after every change to the conversation.
    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Conversation {
        self.state.borrow().clone()
    }

    /// Answer `prompt`, appending the user turn and the assistant turn.
    ///
    /// Blank prompts are ignored and return `None`. Otherwise the routing
    /// decision is returned, even when dispatch failed and an error notice
    /// was recorded instead of an answer.
    pub async fn submit(&self, prompt: &str) -> Option<RoutingDecision> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return None;
        }

        self.state.send_modify(|c| {
            c.push_user(prompt);
        });

        let decision = if self.thinking_floor.is_zero() {
            self.router.route(prompt).await
        } else {
            let (decision, _) = tokio::join!(
                self.router.route(prompt),
                tokio::time::sleep(self.thinking_floor)
            );
            decision
        };
        info!(model = decision.model_id(), "Answering prompt");

        let mut aggregator = StreamAggregator::begin(self.state.clone(), decision.rationale());
        if let Err(e) = self
            .dispatcher
            .dispatch(prompt, &decision, &mut aggregator)
            .await
        {
            warn!("Dispatch to '{}' failed: {}", decision.model_id(), e);
            let failed = aggregator.turn_id();
            self.state.send_modify(|c| {
                c.push_notice(failed, error_message(&e.to_string()), ERROR_RATIONALE);
            });
        }

        Some(decision)
    }
}
