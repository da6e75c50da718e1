//! Aletheia Core - dialectical analysis data model
//!
//! The pure, I/O-free half of the engine:
//! - Phases, agents and log entries
//! - The total result normalizer
//! - The append-only log stream
//! - Engine configuration and error taxonomy
//! - The analysis provider seam
//!
//! # Example
//!
//! ```rust
//! use aletheia_core::normalize;
//! use serde_json::json;
//!
//! let result = normalize(&json!({
//!     "synthesis": { "opportunityScore": 0.42 }
//! }));
//! assert_eq!(result.synthesis.opportunity_score.value(), 42);
//! assert!(result.consensus.points.is_empty());
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod error;
pub mod log_stream;
pub mod narration;
pub mod normalize;
pub mod provider;
pub mod types;

// Re-exports for convenience
pub use config::{EngineConfig, TimelineConfig};
pub use error::{ConfigError, LogStreamError, ProviderError, RunError, ScoreOutOfRange, StateError};
pub use log_stream::LogStream;
pub use normalize::normalize;
pub use provider::AnalysisProvider;
pub use types::{
    Agent, AnalysisResult, ConsensusSection, LogEntry, LogEntryId, Phase, Score, SkepticSection,
    SourceCitation, SynthesisSection, APP_NAME, APP_VERSION,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Aletheia Core
    pub use crate::{
        Agent, AnalysisProvider, AnalysisResult, EngineConfig, LogEntry, LogStream, Phase,
        ProviderError, RunError, Score, TimelineConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
