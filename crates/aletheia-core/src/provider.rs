//! Analysis provider seam
//!
//! The provider turns a query into a raw, untrusted payload. Its prompt
//! design, model choice and transport live outside the engine.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// External collaborator producing the raw analysis payload
///
/// The returned value is never trusted: the controller passes it through
/// [`crate::normalize::normalize`] before anything reads it.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str {
        "provider"
    }

    /// Analyze a query
    ///
    /// # Errors
    /// - `ProviderError` on transport failure, non-success status, or a
    ///   body that is not a JSON object
    async fn analyze(&self, query: &str) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<P: AnalysisProvider + ?Sized> AnalysisProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn analyze(&self, query: &str) -> Result<Value, ProviderError> {
        (**self).analyze(query).await
    }
}
