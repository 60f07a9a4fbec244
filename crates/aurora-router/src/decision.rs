//! The router's output.

use serde::Serialize;

use crate::catalog::{CapabilityClass, ModelDescriptor};

/// Which tier of the cascade produced a decision.
///
/// Logged only; dispatch never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    PrimaryClassifier,
    FallbackClassifier,
    DefaultFallback,
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DecisionSource::PrimaryClassifier => "primary",
            DecisionSource::FallbackClassifier => "fallback",
            DecisionSource::DefaultFallback => "default",
        };
        f.write_str(name)
    }
}

/// Immutable routing result for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    model_id: String,
    display_name: String,
    capability: CapabilityClass,
    backend_model_name: String,
    rationale: String,
    source: DecisionSource,
}

impl RoutingDecision {
    /// Bind a decision to a catalog entry.
    pub fn new(model: &ModelDescriptor, rationale: impl Into<String>, source: DecisionSource) -> Self {
        Self {
            model_id: model.id.clone(),
            display_name: model.display_name.clone(),
            capability: model.capability,
            backend_model_name: model.dispatch_name().to_string(),
            rationale: rationale.into(),
            source,
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn capability(&self) -> CapabilityClass {
        self.capability
    }

    pub fn backend_model_name(&self) -> &str {
        &self.backend_model_name
    }

    /// Short explanation shown before the answer streams in.
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn source(&self) -> DecisionSource {
        self.source
    }
}
