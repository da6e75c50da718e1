//! Phase state machine
//!
//! Legal edges:
//!
//! ```text
//! Idle -> Scanning -> SkepticReview -> Synthesizing -> Complete -> Idle
//!            |              |                |
//!            +--------------+----------------+--> Idle (failure)
//! ```

use aletheia_core::{Phase, StateError};

/// Validate a phase transition
///
/// # Errors
/// - `StateError::IllegalTransition` if the edge does not exist
pub fn validate_transition(from: Phase, to: Phase) -> Result<(), StateError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(StateError::IllegalTransition { from, to })
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: Phase) -> Vec<Phase> {
    match from {
        Phase::Idle => vec![Phase::Scanning],
        Phase::Scanning => vec![Phase::SkepticReview, Phase::Idle],
        Phase::SkepticReview => vec![Phase::Synthesizing, Phase::Idle],
        Phase::Synthesizing => vec![Phase::Complete, Phase::Idle],
        Phase::Complete => vec![Phase::Idle],
    }
}

/// Path from `from` back to `Idle`
///
/// Empty when already idle. Every phase reaches `Idle` in at most one step.
#[must_use]
pub fn path_to_idle(from: Phase) -> Vec<Phase> {
    if from == Phase::Idle {
        Vec::new()
    } else {
        vec![Phase::Idle]
    }
}
