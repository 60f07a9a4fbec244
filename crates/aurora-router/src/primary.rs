//! Primary classifier: the external model-selection service.
//!
//! One attempt, no retry. Every failure mode collapses into [`Unavailable`]
//! so the router can fall through to the next tier.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::ModelCatalog;
use crate::config::RouterConfig;
use crate::decision::{DecisionSource, RoutingDecision};

/// The primary tier could not produce a selection.
#[derive(Debug, Error)]
#[error("selection service unavailable: {0}")]
pub struct Unavailable(pub String);

#[derive(Debug, Serialize)]
struct SelectModelRequest<'a> {
    models: Vec<&'a str>,
    prompt: &'a str,
    cost_bias: f64,
}

#[derive(Debug, Deserialize)]
struct SelectModelResponse {
    selected_model: Option<SelectedModel>,
}

#[derive(Debug, Deserialize)]
struct SelectedModel {
    model_name: Option<String>,
}

/// Client for the `/select-model` endpoint.
pub struct PrimaryClassifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cost_bias: f64,
}

impl PrimaryClassifier {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, cost_bias: f64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            cost_bias,
        }
    }

    /// Build from config, or `None` when no selection key is configured.
    pub fn from_config(config: &RouterConfig) -> Option<Self> {
        config.has_selection_service().then(|| {
            Self::new(
                config.selection_url.clone(),
                config.selection_api_key.clone(),
                config.cost_bias,
            )
        })
    }

    /// Ask the service which cloud model should answer `prompt`.
    pub async fn classify(
        &self,
        prompt: &str,
        catalog: &ModelCatalog,
    ) -> Result<RoutingDecision, Unavailable> {
        let request = SelectModelRequest {
            models: catalog.selection_candidates(),
            prompt,
            cost_bias: self.cost_bias,
        };

        let response = self
            .client
            .post(format!("{}/select-model", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Unavailable(format!("HTTP {}", status)));
        }

        let body: SelectModelResponse = response
            .json()
            .await
            .map_err(|e| Unavailable(format!("unreadable body: {}", e)))?;

        let selected = body
            .selected_model
            .and_then(|m| m.model_name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Unavailable("response has no selected model".to_string()))?;

        debug!("Selection service chose {}", selected);
        Ok(Self::map_selection(&selected, catalog))
    }

    /// Binary mapping: the marker token picks the high-capability model,
    /// anything else the default cloud model.
    fn map_selection(selected: &str, catalog: &ModelCatalog) -> RoutingDecision {
        if selected
            .to_lowercase()
            .contains(catalog.high_capability_marker())
        {
            let model = catalog.high_capability();
            RoutingDecision::new(
                model,
                format!("🧠 Complex Reasoning • Adaptive Router • {}", model.display_name),
                DecisionSource::PrimaryClassifier,
            )
        } else {
            let model = catalog.default_cloud();
            RoutingDecision::new(
                model,
                format!("⚡ Speed Optimized • Adaptive Router • {}", model.display_name),
                DecisionSource::PrimaryClassifier,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CapabilityClass;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service_returning(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/select-model"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    fn selected(name: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "selected_model": { "provider": "anthropic", "model_name": name }
        }))
    }

    #[tokio::test]
    async fn test_opus_marker_any_case_maps_to_high_capability() {
        let server = service_returning(selected("Anthropic/Claude-OPUS-4-20250514")).await;
        let primary = PrimaryClassifier::new(server.uri(), "apk", 0.5);
        let catalog = ModelCatalog::aurora();

        let decision = primary.classify("prove Fermat", &catalog).await.unwrap();
        assert_eq!(decision.model_id(), "claude-opus-4");
        assert_eq!(decision.backend_model_name(), "claude-sonnet-4-20250514");
        assert_eq!(decision.capability(), CapabilityClass::Cloud);
        assert_eq!(decision.source(), DecisionSource::PrimaryClassifier);
        assert!(decision.rationale().contains("Complex Reasoning"));
    }

    #[tokio::test]
    async fn test_other_selection_maps_to_default_cloud() {
        let server = service_returning(selected("anthropic/claude-3-5-haiku-20241022")).await;
        let primary = PrimaryClassifier::new(server.uri(), "apk", 0.5);

        let decision = primary
            .classify("hi", &ModelCatalog::aurora())
            .await
            .unwrap();
        assert_eq!(decision.model_id(), "claude-3-5-haiku");
        assert_eq!(
            decision.rationale(),
            "⚡ Speed Optimized • Adaptive Router • Haiku 3.5"
        );
    }

    #[tokio::test]
    async fn test_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/select-model"))
            .and(header("authorization", "Bearer apk-123"))
            .and(body_partial_json(serde_json::json!({
                "models": [
                    "anthropic/claude-3-5-haiku-20241022",
                    "anthropic/claude-opus-4-20250514"
                ],
                "prompt": "what is 2+2",
                "cost_bias": 0.25
            })))
            .respond_with(selected("claude-3-5-haiku"))
            .expect(1)
            .mount(&server)
            .await;

        let primary = PrimaryClassifier::new(server.uri(), "apk-123", 0.25);
        assert!(primary
            .classify("what is 2+2", &ModelCatalog::aurora())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_non_success_is_unavailable() {
        let server = service_returning(ResponseTemplate::new(503)).await;
        let primary = PrimaryClassifier::new(server.uri(), "apk", 0.5);
        assert!(primary.classify("hi", &ModelCatalog::aurora()).await.is_err());
    }

    #[tokio::test]
    async fn test_unparseable_body_is_unavailable() {
        let server =
            service_returning(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
                .await;
        let primary = PrimaryClassifier::new(server.uri(), "apk", 0.5);
        assert!(primary.classify("hi", &ModelCatalog::aurora()).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_selected_model_is_unavailable() {
        let server = service_returning(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })),
        )
        .await;
        let primary = PrimaryClassifier::new(server.uri(), "apk", 0.5);
        let err = primary
            .classify("hi", &ModelCatalog::aurora())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no selected model"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_unavailable() {
        // Nothing listens on port 9 on loopback.
        let primary = PrimaryClassifier::new("http://127.0.0.1:9", "apk", 0.5);
        assert!(primary.classify("hi", &ModelCatalog::aurora()).await.is_err());
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(PrimaryClassifier::from_config(&RouterConfig::default()).is_none());
        let config = RouterConfig::builder().selection_api_key("apk").build();
        assert!(PrimaryClassifier::from_config(&config).is_some());
    }
}
