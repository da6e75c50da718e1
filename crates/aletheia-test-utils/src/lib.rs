//! Testing utilities for Aletheia workspace
//!
//! Shared payload fixtures and a scripted in-memory provider.

#![allow(missing_docs)]

use aletheia_core::{AnalysisProvider, ProviderError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::time::Duration;

/// A complete, well-formed provider payload with three fallacies
pub fn full_payload() -> Value {
    payload_with_fallacies(3)
}

/// A complete payload with `n` numbered fallacies
pub fn payload_with_fallacies(n: usize) -> Value {
    let fallacies: Vec<String> = (1..=n).map(|i| format!("Fallacy {i}")).collect();
    json!({
        "consensus": {
            "theme": "AI wrappers will capture the value",
            "points": ["Everyone is building chat UIs", "Models commoditize", "Distribution wins"],
            "marketSaturation": 0.87
        },
        "skeptic": {
            "fallacies": fallacies,
            "stagnationPoint": "Prompt engineering as a moat",
            "mimeticTraps": ["Copying the leader's pricing"]
        },
        "synthesis": {
            "secret": "Own the proprietary workflow data",
            "verticalStrategy": "Go deep in one regulated industry",
            "opportunityScore": 73
        },
        "sources": []
    })
}

#[derive(Debug, Clone)]
enum Script {
    Respond(Value),
    Fail(ProviderError),
    Hang,
    Panic(&'static str),
}

/// In-memory provider with a fixed answer
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Script,
    latency: Duration,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Resolve with `payload`
    pub fn ok(payload: Value) -> Self {
        Self::with_script(Script::Respond(payload))
    }

    /// Reject with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    /// Never settle
    pub fn pending() -> Self {
        Self::with_script(Script::Hang)
    }

    /// Panic inside the call
    pub fn panicking(message: &'static str) -> Self {
        Self::with_script(Script::Panic(message))
    }

    /// Delay before answering
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queries received so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl AnalysisProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn analyze(&self, query: &str) -> Result<Value, ProviderError> {
        self.calls.lock().push(query.to_string());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.script {
            Script::Respond(payload) => Ok(payload.clone()),
            Script::Fail(error) => Err(error.clone()),
            Script::Hang => std::future::pending().await,
            Script::Panic(message) => panic!("{message}"),
        }
    }
}
