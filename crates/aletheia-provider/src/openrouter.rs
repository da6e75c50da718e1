//! OpenRouter chat completions client

use crate::config::ProviderConfig;
use crate::extract::{completion_content, extract_json_object};
use crate::prompt::build_request_body;
use aletheia_core::{AnalysisProvider, ProviderError};
use async_trait::async_trait;
use serde_json::{json, Value};

const MAX_ERROR_BODY: usize = 512;

/// Analysis provider backed by an OpenAI-compatible chat completions API
pub struct OpenRouterProvider {
    config: ProviderConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    /// Create a provider, resolving the API key from config or environment
    ///
    /// A missing key is not an error here; every call fails with
    /// `ProviderError::MissingApiKey` instead.
    ///
    /// # Errors
    /// - `ProviderError::Network` if the HTTP client cannot be built
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = config.resolve_api_key();
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// True when an API key was found
    #[inline]
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn transport_error(&self, error: &reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout {
                duration_secs: self.config.request_timeout_secs,
            }
        } else {
            ProviderError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl AnalysisProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn analyze(&self, query: &str) -> Result<Value, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        tracing::debug!(model = %self.config.model, "requesting analysis");

        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&build_request_body(&self.config.model, query))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "provider rejected request");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(body, MAX_ERROR_BODY),
            });
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::UnparseableBody(e.to_string()))?;
        let content = completion_content(&envelope)?;
        let mut payload = extract_json_object(content).map_err(|e| {
            tracing::warn!(error = %e, raw = content, "could not extract payload");
            e
        })?;

        // Upstream carries no grounding metadata
        payload["sources"] = json!([]);
        Ok(payload)
    }
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc".to_string(), 10), "abc");
        assert_eq!(truncate("abcdef".to_string(), 3), "abc");
        // 'é' is two bytes
        assert_eq!(truncate("ééé".to_string(), 3), "é");
    }

    #[tokio::test]
    async fn missing_key_fails_every_call() {
        let provider = OpenRouterProvider {
            config: ProviderConfig::new(),
            api_key: None,
            client: reqwest::Client::new(),
        };
        assert!(!provider.has_api_key());
        assert_eq!(
            provider.analyze("anything").await,
            Err(ProviderError::MissingApiKey)
        );
    }
}
