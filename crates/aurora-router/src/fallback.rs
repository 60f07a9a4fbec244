//! Fallback classifier: a small cloud model used as a zero-shot difficulty
//! classifier.
//!
//! The reply is untrusted free text. Exactly one extraction rule applies
//! (the first balanced `{...}` span) and every failure, whether transport or
//! parse, ends in the same place: [`FallbackClassifier::default_decision`].

use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{ModelCatalog, ModelDescriptor};
use crate::client::{CloudError, CloudInferenceEngine};
use crate::config::RouterConfig;
use crate::decision::{DecisionSource, RoutingDecision};

const DEFAULT_REASON: &str = "Selected by Aurora Router";

/// Why the classifier reply could not be turned into a decision.
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("no JSON object in reply")]
    NoObject,
    #[error("malformed selection object: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown model '{0}'")]
    UnknownModel(String),
}

#[derive(Debug, Error)]
enum FallbackError {
    #[error(transparent)]
    Engine(#[from] CloudError),
    #[error(transparent)]
    Parse(#[from] ParseFailure),
}

#[derive(Debug, Deserialize)]
struct Selection {
    model: String,
    #[serde(default)]
    reason: Option<serde_json::Value>,
}

/// Classifies prompts by asking a fast cloud model to pick from the catalog.
pub struct FallbackClassifier {
    engine: Arc<dyn CloudInferenceEngine>,
    model: String,
    max_tokens: u32,
}

impl FallbackClassifier {
    pub fn new(engine: Arc<dyn CloudInferenceEngine>, model: impl Into<String>) -> Self {
        Self {
            engine,
            model: model.into(),
            max_tokens: 150,
        }
    }

    pub fn from_config(engine: Arc<dyn CloudInferenceEngine>, config: &RouterConfig) -> Self {
        Self {
            engine,
            model: config.router_model.clone(),
            max_tokens: config.router_max_tokens,
        }
    }

    /// Always produces a decision; internal failures yield the default.
    pub async fn classify(&self, prompt: &str, catalog: &ModelCatalog) -> RoutingDecision {
        match self.try_classify(prompt, catalog).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("Fallback classifier failed ({}), using default model", e);
                Self::default_decision(catalog)
            }
        }
    }

    async fn try_classify(
        &self,
        prompt: &str,
        catalog: &ModelCatalog,
    ) -> Result<RoutingDecision, FallbackError> {
        let instruction = build_instruction_prompt(prompt, catalog);

        let reply = self
            .engine
            .complete_raw(&self.model, None, &instruction, self.max_tokens)
            .await?;
        debug!("Fallback classifier reply: {}", reply);

        let (model, reason) = parse_selection(&reply, catalog)?;
        info!("Fallback classifier chose {}", model.id);

        Ok(RoutingDecision::new(
            model,
            format!(
                "{} {} • {}",
                rationale_marker(model, catalog),
                reason,
                model.display_name
            ),
            DecisionSource::FallbackClassifier,
        ))
    }

    /// Fixed decision used when classification fails entirely.
    pub fn default_decision(catalog: &ModelCatalog) -> RoutingDecision {
        let model = catalog.default_cloud();
        RoutingDecision::new(
            model,
            format!("⚡ Default Selection • {}", model.display_name),
            DecisionSource::DefaultFallback,
        )
    }
}

fn rationale_marker(model: &ModelDescriptor, catalog: &ModelCatalog) -> &'static str {
    if model.is_local() {
        "📱"
    } else if catalog.is_high_capability(model) {
        "🧠"
    } else {
        "⚡"
    }
}

/// Build the classifier instruction: the user prompt plus a rubric that lists
/// catalog models cheapest first, then the answer-format contract.
pub fn build_instruction_prompt(prompt: &str, catalog: &ModelCatalog) -> String {
    let mut out = String::from(
        "You are Aurora Router, an AI model selector. Analyze this user prompt and select \
         the BEST model based on DIFFICULTY LEVEL.\n\nDIFFICULTY TIERS (be strict about these):\n",
    );

    for model in catalog.models() {
        let kind = if model.is_local() {
            "Local"
        } else {
            "Cloud"
        };
        let _ = writeln!(
            out,
            "\n{} ({}) - {}, {}:",
            model.tier_label, model.id, kind, model.tier_hint
        );
        for line in &model.guidance {
            let _ = writeln!(out, "- {}", line);
        }
    }

    let _ = write!(
        out,
        "\nUser prompt: \"{}\"\n\n\
         Respond with ONLY a JSON object (no markdown, no explanation):\n\
         {{\"model\": \"model-id\", \"reason\": \"brief reason for selection\"}}\n\n\
         IMPORTANT: Scientific explanations (like Schrödinger's equation, quantum mechanics, \
         relativity) are HARD - use {}!",
        prompt,
        catalog.high_capability().id
    );

    out
}

/// Decode the first balanced JSON object in `reply` into a catalog model and
/// a reason.
pub fn parse_selection<'c>(
    reply: &str,
    catalog: &'c ModelCatalog,
) -> Result<(&'c ModelDescriptor, String), ParseFailure> {
    let fragment = first_json_object(reply).ok_or(ParseFailure::NoObject)?;
    let selection: Selection = serde_json::from_str(fragment)?;

    let model = catalog
        .get(selection.model.trim())
        .ok_or_else(|| ParseFailure::UnknownModel(selection.model.clone()))?;

    let reason = selection
        .reason
        .as_ref()
        .and_then(|r| r.as_str())
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REASON)
        .to_string();

    Ok((model, reason))
}

/// First `{ ... }` span whose braces balance, ignoring braces inside JSON
/// string literals.
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
