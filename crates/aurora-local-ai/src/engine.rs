//! The on-device inference engine seen by the router.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::LlamaCppClient;
use crate::error::LocalAIError;
use crate::model::{ModelInfo, ModelManager};
use crate::server::LlamaCppServer;
use crate::DEFAULT_PORT;

/// Capability exposed by an on-device model.
///
/// Implementations own their model files and runtime; callers only ask
/// whether the model can answer right now, trigger a download, or run a
/// token-streaming completion.
#[async_trait]
pub trait LocalInferenceEngine: Send + Sync {
    /// Whether the model weights are present and the engine can complete.
    fn is_ready(&self) -> bool;

    /// Fetch the model, reporting progress as a fraction in `0.0..=1.0`.
    async fn download(&self, on_progress: &mut (dyn FnMut(f64) + Send))
        -> Result<(), LocalAIError>;

    /// Run a completion for `prompt`, calling `on_token` for every token in
    /// arrival order. Returns once generation has finished.
    async fn complete(
        &self,
        prompt: &str,
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Result<(), LocalAIError>;
}

/// [`LocalInferenceEngine`] backed by a llama-server child process.
pub struct LlamaCppEngine {
    model: ModelInfo,
    manager: ModelManager,
    port: u16,
    max_tokens: i32,
    startup_timeout: Duration,
    /// Set when the server is managed elsewhere.
    server_url: Option<String>,
    server: Mutex<Option<LlamaCppServer>>,
}

impl LlamaCppEngine {
    /// Create an engine for a registered on-device model id.
    pub fn new(model_id: &str) -> Result<Self, LocalAIError> {
        Ok(Self::for_model(ModelManager::find(model_id)?))
    }

    /// Create an engine for an explicit model entry.
    pub fn for_model(model: ModelInfo) -> Self {
        Self {
            model,
            manager: ModelManager::new(),
            port: DEFAULT_PORT,
            max_tokens: 512,
            startup_timeout: Duration::from_secs(60),
            server_url: None,
            server: Mutex::new(None),
        }
    }

    /// Store and look up model files through a custom manager.
    pub fn with_manager(mut self, manager: ModelManager) -> Self {
        self.manager = manager;
        self
    }

    /// Port the managed llama-server listens on.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Talk to an already running server instead of spawning one.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Cap on generated tokens per completion.
    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The model this engine runs.
    pub fn model(&self) -> &ModelInfo {
        &self.model
    }

    /// Stop the managed llama-server, if one was started.
    pub async fn shutdown(&self) -> Result<(), LocalAIError> {
        if let Some(mut server) = self.server.lock().await.take() {
            server.stop()?;
        }
        Ok(())
    }

    /// Return a client for a healthy server, starting one if needed.
    async fn ensure_server(&self) -> Result<LlamaCppClient, LocalAIError> {
        if let Some(url) = &self.server_url {
            return Ok(LlamaCppClient::with_url(url.clone()));
        }

        let mut guard = self.server.lock().await;
        if let Some(server) = guard.as_mut() {
            if server.is_running() {
                return Ok(server.client());
            }
            debug!("llama-server for '{}' exited, restarting", self.model.id);
        }

        let mut server =
            LlamaCppServer::new(self.manager.model_path(&self.model)).with_port(self.port);
        server.start()?;
        server.wait_ready(self.startup_timeout).await?;

        let client = server.client();
        *guard = Some(server);
        Ok(client)
    }
}

#[async_trait]
impl LocalInferenceEngine for LlamaCppEngine {
    fn is_ready(&self) -> bool {
        self.manager.is_installed(&self.model)
    }

    async fn download(
        &self,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<(), LocalAIError> {
        self.manager.download(&self.model, on_progress).await?;
        Ok(())
    }

    async fn complete(
        &self,
        prompt: &str,
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Result<(), LocalAIError> {
        if !self.is_ready() {
            return Err(LocalAIError::ModelNotFound(self.model.id.clone()));
        }

        let client = self.ensure_server().await?;
        info!("Running local completion with '{}'", self.model.id);
        client
            .complete_stream(prompt, self.max_tokens, on_token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_in(dir: &std::path::Path) -> LlamaCppEngine {
        LlamaCppEngine::new("qwen3-0.6")
            .unwrap()
            .with_manager(ModelManager::with_models_dir(dir))
    }

    #[test]
    fn test_unknown_model() {
        assert!(matches!(
            LlamaCppEngine::new("claude-opus-4"),
            Err(LocalAIError::UnknownModel(_))
        ));
    }

    #[tokio::test]
    async fn test_not_ready_refuses_completion() {
        let dir = tempdir().unwrap();
        let engine = engine_in(dir.path());

        assert!(!engine.is_ready());
        let result = engine.complete("hello", &mut |_: &str| {}).await;
        assert!(matches!(result, Err(LocalAIError::ModelNotFound(_))));
    }

    #[tokio::test]
    async fn test_complete_against_running_server() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Paris\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\".\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let engine = engine_in(dir.path()).with_server_url(server.uri());
        std::fs::write(engine.manager.model_path(engine.model()), b"gguf").unwrap();
        assert!(engine.is_ready());

        let mut text = String::new();
        engine
            .complete("Capital of France?", &mut |t: &str| text.push_str(t))
            .await
            .unwrap();
        assert_eq!(text, "Paris.");
    }
}
