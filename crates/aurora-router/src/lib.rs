//! # Aurora Router
//!
//! Picks the right model for each prompt, runs it, and streams the answer
//! into a conversation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────────────────┐     ┌──────────────┐
//! │   Prompt    │ --> │          Router           │ --> │  Dispatcher  │
//! └─────────────┘     │ primary ─(fail)─> fallback│     │ local | cloud│
//!                     └────────────┬──────────────┘     └──────┬───────┘
//!                                  │                           │ tokens
//!                           ┌──────┴──────┐           ┌────────┴─────────┐
//!                           │ModelCatalog │           │ StreamAggregator │
//!                           └─────────────┘           │  (Conversation)  │
//!                                                     └──────────────────┘
//! ```
//!
//! ## Routing tiers
//!
//! - **Primary** - external selection service, bounded by a timeout
//! - **Fallback** - cloud-model classifier; falls back to the catalog's
//!   default cloud model on any failure
//!
//! ## Usage
//!
//! ```ignore
//! use aurora_router::{ChatSession, ClaudeClient, Dispatcher, ModelCatalog, Router, RouterConfig};
//!
//! let config = RouterConfig::from_env();
//! let cloud = Arc::new(ClaudeClient::new(&config.anthropic_api_key, &config.anthropic_url)?);
//! let router = Router::from_config(&config, Arc::new(ModelCatalog::aurora()), cloud.clone());
//! let dispatcher = Dispatcher::from_config(cloud, &config);
//! let session = ChatSession::from_config(&config, Arc::new(router), Arc::new(dispatcher));
//!
//! session.submit("What is 2+2?").await;
//! ```

mod catalog;
mod client;
mod config;
mod conversation;
mod decision;
mod dispatch;
mod fallback;
mod primary;
mod router;
mod session;
mod stream;

#[cfg(test)]
mod testing;

pub use catalog::{CapabilityClass, CatalogError, ModelCatalog, ModelDescriptor};
pub use client::{ClaudeClient, CloudError, CloudInferenceEngine};
pub use config::{
    RouterConfig, RouterConfigBuilder, DEFAULT_ANTHROPIC_URL, DEFAULT_ROUTER_MODEL,
    DEFAULT_SELECTION_URL,
};
pub use conversation::{
    shared_conversation, Conversation, ConversationTurn, Role, SharedConversation,
    StreamAggregator, TurnId,
};
pub use decision::{DecisionSource, RoutingDecision};
pub use dispatch::{
    not_downloaded_message, DispatchError, Dispatcher, ANSWER_SYSTEM_PROMPT,
    LOCAL_FAILURE_MESSAGE,
};
pub use fallback::{
    build_instruction_prompt, first_json_object, parse_selection, FallbackClassifier,
    ParseFailure,
};
pub use primary::{PrimaryClassifier, Unavailable};
pub use router::Router;
pub use session::{error_message, ChatSession, ERROR_RATIONALE};
pub use stream::{replay_words, strip_thinking, word_chunks, TokenSink};

// Re-export local AI types
pub use aurora_local_ai::{
    LlamaCppEngine, LocalAIError, LocalInferenceEngine, ModelInfo, ModelManager,
    DEFAULT_PORT as DEFAULT_LOCAL_AI_PORT,
};
