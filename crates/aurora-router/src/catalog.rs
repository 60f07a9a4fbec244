//! Registry of routable models.
//!
//! The catalog is the only place model identities live. Both classifier
//! tiers resolve their answers against it and the dispatcher reads the
//! capability class and backend name it copies into each decision.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Where a model executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityClass {
    /// On-device inference.
    Local,
    /// Remote API.
    Cloud,
}

impl std::fmt::Display for CapabilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityClass::Local => f.pad("local"),
            CapabilityClass::Cloud => f.pad("cloud"),
        }
    }
}

/// Identity of a routable model.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    /// Stable short key, unique in the catalog.
    pub id: String,
    /// Human label.
    pub display_name: String,
    pub capability: CapabilityClass,
    /// Identifier the engine expects. Required for cloud models.
    pub backend_model_name: Option<String>,
    /// Name registered with the primary selection service, if any.
    pub selection_name: Option<String>,
    /// Difficulty tier shown in the fallback rubric.
    pub tier_label: String,
    /// Speed/quality trade-off shown next to the tier, e.g. "fastest".
    pub tier_hint: String,
    /// Prompt characteristics that belong to this model.
    pub guidance: Vec<String>,
}

impl ModelDescriptor {
    pub fn local(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            capability: CapabilityClass::Local,
            backend_model_name: None,
            selection_name: None,
            tier_label: String::new(),
            tier_hint: String::new(),
            guidance: Vec::new(),
        }
    }

    pub fn cloud(
        id: impl Into<String>,
        display_name: impl Into<String>,
        backend_model_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            capability: CapabilityClass::Cloud,
            backend_model_name: Some(backend_model_name.into()),
            selection_name: None,
            tier_label: String::new(),
            tier_hint: String::new(),
            guidance: Vec::new(),
        }
    }

    pub fn with_selection_name(mut self, name: impl Into<String>) -> Self {
        self.selection_name = Some(name.into());
        self
    }

    pub fn with_tier<I, S>(
        mut self,
        label: impl Into<String>,
        hint: impl Into<String>,
        guidance: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tier_label = label.into();
        self.tier_hint = hint.into();
        self.guidance = guidance.into_iter().map(Into::into).collect();
        self
    }

    /// Name handed to the engine. Local models are addressed by id.
    pub fn dispatch_name(&self) -> &str {
        self.backend_model_name.as_deref().unwrap_or(&self.id)
    }

    pub fn is_local(&self) -> bool {
        self.capability == CapabilityClass::Local
    }
}

/// Catalog construction errors.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("duplicate model id '{0}'")]
    DuplicateId(String),
    #[error("cloud model '{0}' has no backend model name")]
    MissingBackendName(String),
    #[error("role '{role}' references unknown model '{id}'")]
    UnknownRoleModel { role: &'static str, id: String },
    #[error("role '{role}' must reference a cloud model, '{id}' is local")]
    RoleNotCloud { role: &'static str, id: String },
}

/// Static registry of routable models, ordered cheapest/fastest first.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    default_cloud: usize,
    high_capability: usize,
    high_capability_marker: String,
}

impl ModelCatalog {
    /// Build and validate a catalog.
    ///
    /// `default_cloud` is the fast general-purpose cloud model every failed
    /// classification lands on; `high_capability` is chosen when the
    /// primary service answers with a name containing `marker`.
    pub fn new(
        models: Vec<ModelDescriptor>,
        default_cloud: &str,
        high_capability: &str,
        marker: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for model in &models {
            if !seen.insert(model.id.as_str()) {
                return Err(CatalogError::DuplicateId(model.id.clone()));
            }
            if model.capability == CapabilityClass::Cloud
                && model.backend_model_name.as_deref().map_or(true, str::is_empty)
            {
                return Err(CatalogError::MissingBackendName(model.id.clone()));
            }
        }

        let default_cloud = Self::cloud_role(&models, "default_cloud", default_cloud)?;
        let high_capability = Self::cloud_role(&models, "high_capability", high_capability)?;

        Ok(Self {
            models,
            default_cloud,
            high_capability,
            high_capability_marker: marker.into().to_lowercase(),
        })
    }

    fn cloud_role(
        models: &[ModelDescriptor],
        role: &'static str,
        id: &str,
    ) -> Result<usize, CatalogError> {
        let index = models
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| CatalogError::UnknownRoleModel {
                role,
                id: id.to_string(),
            })?;
        if models[index].is_local() {
            return Err(CatalogError::RoleNotCloud {
                role,
                id: id.to_string(),
            });
        }
        Ok(index)
    }

    /// The four models Aurora ships with: two on-device, two cloud.
    ///
    /// The high-capability entry is registered with the selection service
    /// under its Opus name but dispatched to a Sonnet backend.
    pub fn aurora() -> Self {
        let models = vec![
            ModelDescriptor::local("smollm2-360m", "SmolLM2").with_tier(
                "🟢 EASY",
                "fastest",
                [
                    "Basic math: 1+1, 2*3, simple arithmetic",
                    "Single word answers: \"What color is the sky?\"",
                    "Yes/no questions",
                    "Very short factual lookups",
                ],
            ),
            ModelDescriptor::local("qwen3-0.6", "Qwen 3").with_tier(
                "🟡 EASY-MEDIUM",
                "balanced",
                [
                    "Simple factual questions: capitals, dates, definitions",
                    "Basic translations",
                    "Short summaries",
                    "Simple \"how to\" questions",
                ],
            ),
            ModelDescriptor::cloud("claude-3-5-haiku", "Haiku 3.5", "claude-3-5-haiku-20241022")
                .with_selection_name("anthropic/claude-3-5-haiku-20241022")
                .with_tier(
                    "🟠 MEDIUM-HARD",
                    "quality",
                    [
                        "Coding help and debugging",
                        "Creative writing (poems, stories)",
                        "Detailed explanations of concepts",
                        "Multi-step instructions",
                        "Analysis of text or situations",
                    ],
                ),
            ModelDescriptor::cloud("claude-opus-4", "Opus 4", "claude-sonnet-4-20250514")
                .with_selection_name("anthropic/claude-opus-4-20250514")
                .with_tier(
                    "🔴 HARD",
                    "premium",
                    [
                        "Complex scientific explanations (quantum physics, relativity, advanced math)",
                        "Deep philosophical questions",
                        "Multi-step reasoning problems",
                        "Research-level questions",
                        "Anything requiring expert-level knowledge",
                        "Complex coding architecture",
                        "Explaining equations or theorems",
                    ],
                ),
        ];

        Self {
            models,
            default_cloud: 2,
            high_capability: 3,
            high_capability_marker: "opus".to_string(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Fast, general-purpose cloud model.
    pub fn default_cloud(&self) -> &ModelDescriptor {
        &self.models[self.default_cloud]
    }

    pub fn high_capability(&self) -> &ModelDescriptor {
        &self.models[self.high_capability]
    }

    /// Lowercase token marking a high-capability selection.
    pub fn high_capability_marker(&self) -> &str {
        &self.high_capability_marker
    }

    pub fn is_high_capability(&self, model: &ModelDescriptor) -> bool {
        model.id == self.high_capability().id
    }

    /// Names sent to the primary selection service.
    pub fn selection_candidates(&self) -> Vec<&str> {
        self.models
            .iter()
            .filter_map(|m| m.selection_name.as_deref())
            .collect()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::aurora()
    }
}
