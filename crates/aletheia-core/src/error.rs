//! Error types for Aletheia Core
//!
//! Provides error handling for:
//! - Analysis provider failures
//! - Run failures surfaced at the controller boundary
//! - Illegal phase transitions
//! - Log stream and configuration invariants

use crate::types::Phase;

/// Failure of the external analysis provider
///
/// The controller treats every variant the same way; the variant only
/// changes the text of the failure entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// No API key configured
    #[error("API key is missing")]
    MissingApiKey,

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("provider returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Response carried no content
    #[error("provider returned no content")]
    EmptyResponse,

    /// Body could not be parsed into a JSON object
    #[error("unparseable provider body: {0}")]
    UnparseableBody(String),

    /// Call did not settle in time
    #[error("provider timed out after {duration_secs}s")]
    Timeout {
        /// Budget that elapsed
        duration_secs: u64,
    },
}

impl ProviderError {
    /// Short label used in viewer-facing failure text
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey => "missing api key",
            Self::Network(_) => "connection severed",
            Self::Status { .. } => "upstream rejected request",
            Self::EmptyResponse => "empty response",
            Self::UnparseableBody(_) => "malformed response",
            Self::Timeout { .. } => "timed out",
        }
    }

    /// Check if a later submission could plausibly succeed unchanged
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout { .. } | Self::EmptyResponse => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MissingApiKey | Self::UnparseableBody(_) => false,
        }
    }
}

/// Failure of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    /// Provider call failed
    #[error("provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// Payload could not be turned into a result
    #[error("malformed result: {0}")]
    MalformedResult(String),

    /// A newer run took over the session
    #[error("run superseded by a newer submission")]
    Superseded,

    /// Internal phase bookkeeping went wrong
    #[error("state error: {0}")]
    Transition(#[from] StateError),

    /// Run task died without settling the session
    #[error("run aborted: {0}")]
    Internal(String),
}

impl RunError {
    /// Short label used in viewer-facing failure text
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.kind(),
            Self::MalformedResult(_) => "data malformed",
            Self::Superseded => "superseded",
            Self::Transition(_) => "internal state error",
            Self::Internal(_) => "internal failure",
        }
    }

    /// True when the failure must be reported to the viewer
    #[inline]
    #[must_use]
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::Superseded)
    }
}

/// Phase state machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Edge not present in the state machine
    #[error("illegal phase transition {from} -> {to}")]
    IllegalTransition {
        /// Current phase
        from: Phase,
        /// Requested phase
        to: Phase,
    },
}

/// Score outside `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("score {0} is outside [0, 100]")]
pub struct ScoreOutOfRange(pub u8);

/// Log stream invariant violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogStreamError {
    /// Entry would move time backwards
    #[error("entry timestamp precedes the last appended entry")]
    TimestampRegression,
}

/// Invalid configuration value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration for `{field}`: {reason}")]
pub struct ConfigError {
    /// Offending field
    pub field: &'static str,
    /// Why it was rejected
    pub reason: String,
}

impl ConfigError {
    /// Create new configuration error
    #[inline]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
