//! Aletheia Provider - OpenRouter analysis client
//!
//! Implements [`aletheia_core::AnalysisProvider`] over an OpenAI-compatible
//! chat completions endpoint. The model is asked for a JSON object; the
//! object is dug out of whatever text comes back and handed to the
//! controller unnormalized.

#![warn(unreachable_pub)]

pub mod config;
pub mod extract;
pub mod openrouter;
pub mod prompt;

pub use config::{ProviderConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use extract::{completion_content, extract_json_object};
pub use openrouter::OpenRouterProvider;
