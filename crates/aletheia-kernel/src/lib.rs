//! Aletheia Kernel - phase orchestration and narrated event timeline
//!
//! Drives one dialectical analysis run at a time:
//! - `controller`: submit/reset contract, run pipeline and supervision
//! - `scheduler`: deadline-ordered narration timeline with group cancel
//! - `session`: observable phase, log and result
//! - `state_machine`: legal phase edges
//!
//! # Example
//!
//! ```rust,no_run
//! use aletheia_core::EngineConfig;
//! use aletheia_kernel::AnalysisController;
//! use aletheia_provider::{OpenRouterProvider, ProviderConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenRouterProvider::new(ProviderConfig::default())?;
//! let controller = AnalysisController::new(provider, EngineConfig::default());
//!
//! if let Some(run) = controller.submit("vertical farming") {
//!     run.wait().await;
//! }
//! assert!(controller.phase().is_terminal());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod controller;
pub mod dossier;
pub mod scheduler;
pub mod session;
pub mod state_machine;
pub mod telemetry;

pub use config::{AppConfig, ConfigError};
pub use controller::{AnalysisController, RunHandle, RunOutcome};
pub use scheduler::{NarrationBatch, ScheduledHandle, SchedulerError, Timeline};
pub use session::{RunId, SessionSnapshot, SessionState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving analysis runs
    pub use crate::{AnalysisController, AppConfig, RunOutcome, SessionSnapshot};
    pub use aletheia_core::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
