//! Two-tier routing cascade.
//!
//! Order: primary selection service, then fallback classifier (which owns
//! the default). The tiers never race; the fallback only runs after the
//! primary has definitively failed or timed out.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::ModelCatalog;
use crate::client::CloudInferenceEngine;
use crate::config::RouterConfig;
use crate::decision::RoutingDecision;
use crate::fallback::FallbackClassifier;
use crate::primary::PrimaryClassifier;

/// Picks the model that answers a prompt.
pub struct Router {
    catalog: Arc<ModelCatalog>,
    primary: Option<PrimaryClassifier>,
    fallback: FallbackClassifier,
    primary_timeout: Duration,
}

impl Router {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        primary: Option<PrimaryClassifier>,
        fallback: FallbackClassifier,
    ) -> Self {
        Self {
            catalog,
            primary,
            fallback,
            primary_timeout: RouterConfig::default().primary_timeout,
        }
    }

    /// Wire both tiers from configuration. The fallback tier talks to `cloud`.
    pub fn from_config(
        config: &RouterConfig,
        catalog: Arc<ModelCatalog>,
        cloud: Arc<dyn CloudInferenceEngine>,
    ) -> Self {
        Self {
            catalog,
            primary: PrimaryClassifier::from_config(config),
            fallback: FallbackClassifier::from_config(cloud, config),
            primary_timeout: config.primary_timeout,
        }
    }

    pub fn with_primary_timeout(mut self, timeout: Duration) -> Self {
        self.primary_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Route `prompt` to a catalog model. Never fails.
    pub async fn route(&self, prompt: &str) -> RoutingDecision {
        match &self.primary {
            Some(primary) => {
                let attempt = tokio::time::timeout(
                    self.primary_timeout,
                    primary.classify(prompt, &self.catalog),
                )
                .await;

                match attempt {
                    Ok(Ok(decision)) => {
                        info!(
                            model = decision.model_id(),
                            source = %decision.source(),
                            "Routed prompt"
                        );
                        return decision;
                    }
                    Ok(Err(unavailable)) => warn!("{}, trying fallback classifier", unavailable),
                    Err(_) => warn!(
                        "Selection service timed out after {:?}, trying fallback classifier",
                        self.primary_timeout
                    ),
                }
            }
            None => debug!("No selection service configured, using fallback classifier"),
        }

        let decision = self.fallback.classify(prompt, &self.catalog).await;
        info!(
            model = decision.model_id(),
            source = %decision.source(),
            "Routed prompt"
        );
        decision
    }
}
