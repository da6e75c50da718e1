//! Application configuration
//!
//! One TOML file with an `[engine]` and a `[provider]` table. Every field
//! is optional; missing ones take their defaults.
//!
//! ```toml
//! [engine]
//! provider_timeout_secs = 30
//!
//! [engine.timeline]
//! fallacy_stagger_ms = 400
//!
//! [provider]
//! model = "google/gemini-2.0-flash-exp:free"
//! ```

use aletheia_core::EngineConfig;
use aletheia_provider::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be rendered
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error(transparent)]
    Invalid(#[from] aletheia_core::ConfigError),
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine pacing and budgets
    pub engine: EngineConfig,
    /// Provider endpoint
    pub provider: ProviderConfig,
}

impl AppConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With engine configuration
    #[inline]
    #[must_use]
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// With provider configuration
    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = provider;
        self
    }

    /// Load from `path`, or defaults when no path is given
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` if it is not valid TOML
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Parse` or `ConfigError::Invalid`
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML; the API key is never written
    ///
    /// # Errors
    /// - `ConfigError::Serialize` if rendering fails
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section
    ///
    /// # Errors
    /// - `aletheia_core::ConfigError` naming the first bad field
    pub fn validate(&self) -> Result<(), aletheia_core::ConfigError> {
        self.engine.validate()?;
        self.provider.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_gives_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.engine.provider_timeout_secs, 60);
    }

    #[test]
    fn loads_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [engine.timeline]
            fallacy_stagger_ms = 400

            [provider]
            model = "test/model"
            "#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.engine.timeline.fallacy_stagger_ms, 400);
        assert_eq!(config.engine.timeline.stagnation_offset_ms, 2500);
        assert_eq!(config.provider.model, "test/model");
        assert_eq!(config.provider.title, "Aletheia");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn wrong_offset_count_is_parse_error() {
        let err = AppConfig::from_toml_str(
            r"
            [engine.timeline]
            scan_narration_offsets_ms = [1, 2, 3]
            ",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn out_of_range_is_invalid() {
        let err = AppConfig::from_toml_str(
            r"
            [engine]
            provider_timeout_secs = 0
            ",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rendered_config_round_trips() {
        let config = AppConfig::new().with_provider(ProviderConfig::new().with_api_key("sk-x"));
        let text = config.to_toml_string().unwrap();
        assert!(!text.contains("sk-x"));

        let reloaded = AppConfig::from_toml_str(&text).unwrap();
        assert_eq!(reloaded.engine, config.engine);
        assert_eq!(reloaded.provider.api_key, None);
    }
}
