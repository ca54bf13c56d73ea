//! Narrative service configuration.

use std::time::Duration;

/// Default endpoint root (OpenAI-compatible).
pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V2.5";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the narrative service.
///
/// Without an API key the service is considered unconfigured and every
/// narrative request falls back to local content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bearer token.
    pub api_key: Option<String>,
    /// Endpoint root; `/chat/completions` is appended.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the endpoint root.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Read `AW_API_KEY`, `AW_BASE_URL`, `AW_MODEL`, and `AW_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank and unparseable
    /// values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(key) = get("AW_API_KEY") {
            config = config.with_api_key(key.trim());
        }
        if let Some(url) = get("AW_BASE_URL") {
            config = config.with_base_url(url.trim());
        }
        if let Some(model) = get("AW_MODEL") {
            config = config.with_model(model.trim());
        }
        if let Some(secs) = get("AW_TIMEOUT_SECS").and_then(|s| s.trim().parse::<u64>().ok()) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}
