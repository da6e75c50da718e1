//! Provider configuration

use aletheia_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenRouter chat completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// Environment variables consulted for the API key, in order
pub const API_KEY_VARS: [&str; 2] = ["OPENROUTER_API_KEY", "API_KEY"];

/// OpenRouter client configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Chat completions endpoint
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// API key; falls back to the environment when unset
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// `HTTP-Referer` header
    pub referer: String,
    /// `X-Title` header
    pub title: String,
    /// Transport timeout for one request
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With explicit API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Request timeout as a duration
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the API key from config, then the process environment
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Resolve the API key using `lookup` for environment variables
    ///
    /// Blank values are treated as unset.
    pub fn resolve_api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        let non_blank = |s: String| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };
        self.api_key
            .clone()
            .and_then(non_blank)
            .or_else(|| API_KEY_VARS.iter().find_map(|var| lookup(var).and_then(non_blank)))
    }

    /// Check internal consistency
    ///
    /// # Errors
    /// - `ConfigError` for an empty endpoint or model, or a zero timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::new("provider.base_url", "must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::new("provider.model", "must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::new(
                "provider.request_timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            referer: "https://aletheia.app".to_string(),
            title: "Aletheia".to_string(),
            request_timeout_secs: 60,
        }
    }
}

// Keeps the key out of logs
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
