//! CLI commands.

pub mod ask;
pub mod chat;
pub mod info;
pub mod model;
pub mod models;
pub mod route;

use aurora_router::{
    ChatSession, ClaudeClient, Dispatcher, LlamaCppEngine, ModelCatalog, Router, RouterConfig,
};
use std::sync::Arc;

/// Wire router, dispatcher and one llama-server engine per local model.
pub(crate) fn build_session(config: &RouterConfig) -> miette::Result<ChatSession> {
    let cloud = cloud_client(config)?;
    let router = Router::from_config(config, Arc::new(ModelCatalog::aurora()), cloud.clone());

    let mut dispatcher = Dispatcher::from_config(cloud, config);
    let local_models = router.catalog().models().iter().filter(|m| m.is_local());
    for (offset, model) in local_models.enumerate() {
        let engine = LlamaCppEngine::new(&model.id)
            .map_err(|e| miette::miette!("Failed to set up local model '{}': {}", model.id, e))?
            .with_port(config.local_port.saturating_add(offset as u16))
            .with_max_tokens(config.answer_max_tokens as i32);
        dispatcher = dispatcher.with_local_engine(model.id.clone(), Arc::new(engine));
    }

    Ok(ChatSession::from_config(
        config,
        Arc::new(router),
        Arc::new(dispatcher),
    ))
}

pub(crate) fn build_router(config: &RouterConfig) -> miette::Result<Router> {
    let catalog = Arc::new(ModelCatalog::aurora());
    Ok(Router::from_config(config, catalog, cloud_client(config)?))
}

fn cloud_client(config: &RouterConfig) -> miette::Result<Arc<ClaudeClient>> {
    let client = ClaudeClient::new(&config.anthropic_api_key, &config.anthropic_url)
        .map_err(|e| miette::miette!("Failed to create Anthropic client: {}", e))?;
    Ok(Arc::new(client))
}
