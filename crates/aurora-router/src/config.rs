//! Router configuration.

use std::time::Duration;

/// Anthropic Messages API base URL.
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";

/// Model-selection service base URL.
pub const DEFAULT_SELECTION_URL: &str = "https://api.llmadaptive.uk/v1";

/// Small, fast cloud model used as the fallback classifier.
pub const DEFAULT_ROUTER_MODEL: &str = "claude-3-5-haiku-20241022";

/// Configuration for routing and dispatch.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Anthropic API key (cloud answers and the fallback classifier)
    pub anthropic_api_key: String,
    /// Anthropic API base URL
    pub anthropic_url: String,
    /// Selection service API key; empty disables the primary tier
    pub selection_api_key: String,
    /// Selection service base URL
    pub selection_url: String,
    /// Cost bias sent to the selection service (0.0 = cheapest, 1.0 = best)
    pub cost_bias: f64,
    /// Upper bound on one primary classifier round trip
    pub primary_timeout: Duration,
    /// Cloud model the fallback classifier asks
    pub router_model: String,
    /// Token cap for the fallback classifier reply
    pub router_max_tokens: u32,
    /// Token cap for cloud answers
    pub answer_max_tokens: u32,
    /// Pause between simulated-stream word chunks
    pub chunk_delay: Duration,
    /// Minimum time the routing step is shown as "thinking"
    pub thinking_floor: Duration,
    /// First port used for on-device llama-server instances
    pub local_port: u16,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: String::new(),
            anthropic_url: DEFAULT_ANTHROPIC_URL.to_string(),
            selection_api_key: String::new(),
            selection_url: DEFAULT_SELECTION_URL.to_string(),
            cost_bias: 0.5,
            primary_timeout: Duration::from_secs(10),
            router_model: DEFAULT_ROUTER_MODEL.to_string(),
            router_max_tokens: 150,
            answer_max_tokens: 512,
            chunk_delay: Duration::from_millis(30),
            thinking_floor: Duration::from_millis(2000),
            local_port: aurora_local_ai::DEFAULT_PORT,
        }
    }
}

impl RouterConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY")
            .or_else(|_| std::env::var("CLAUDE_API_KEY"))
            .unwrap_or_default();

        let selection_api_key = std::env::var("ADAPTIVE_API_KEY").unwrap_or_default();

        Self {
            anthropic_api_key,
            anthropic_url: std::env::var("AURORA_ANTHROPIC_URL")
                .unwrap_or(defaults.anthropic_url),
            selection_api_key,
            selection_url: std::env::var("AURORA_SELECTION_URL")
                .unwrap_or(defaults.selection_url),
            cost_bias: env_parse("AURORA_COST_BIAS").unwrap_or(defaults.cost_bias),
            primary_timeout: env_parse("AURORA_PRIMARY_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.primary_timeout),
            router_model: std::env::var("AURORA_ROUTER_MODEL").unwrap_or(defaults.router_model),
            router_max_tokens: defaults.router_max_tokens,
            answer_max_tokens: env_parse("AURORA_MAX_TOKENS")
                .unwrap_or(defaults.answer_max_tokens),
            chunk_delay: env_parse("AURORA_CHUNK_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.chunk_delay),
            thinking_floor: env_parse("AURORA_THINKING_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.thinking_floor),
            local_port: env_parse("AURORA_LOCAL_PORT").unwrap_or(defaults.local_port),
        }
    }

    /// Whether cloud models can be called at all.
    pub fn has_cloud_access(&self) -> bool {
        !self.anthropic_api_key.is_empty()
    }

    /// Whether the primary selection service is configured.
    pub fn has_selection_service(&self) -> bool {
        !self.selection_api_key.is_empty()
    }

    /// Create a builder for configuration.
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for router configuration.
#[derive(Debug, Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    pub fn anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.anthropic_api_key = key.into();
        self
    }

    pub fn anthropic_url(mut self, url: impl Into<String>) -> Self {
        self.config.anthropic_url = url.into();
        self
    }

    pub fn selection_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.selection_api_key = key.into();
        self
    }

    pub fn selection_url(mut self, url: impl Into<String>) -> Self {
        self.config.selection_url = url.into();
        self
    }

    pub fn cost_bias(mut self, bias: f64) -> Self {
        self.config.cost_bias = bias;
        self
    }

    pub fn primary_timeout(mut self, timeout: Duration) -> Self {
        self.config.primary_timeout = timeout;
        self
    }

    pub fn router_model(mut self, model: impl Into<String>) -> Self {
        self.config.router_model = model.into();
        self
    }

    pub fn answer_max_tokens(mut self, tokens: u32) -> Self {
        self.config.answer_max_tokens = tokens;
        self
    }

    pub fn chunk_delay(mut self, delay: Duration) -> Self {
        self.config.chunk_delay = delay;
        self
    }

    pub fn thinking_floor(mut self, floor: Duration) -> Self {
        self.config.thinking_floor = floor;
        self
    }

    pub fn local_port(mut self, port: u16) -> Self {
        self.config.local_port = port;
        self
    }

    pub fn build(self) -> RouterConfig {
        self.config
    }
}
