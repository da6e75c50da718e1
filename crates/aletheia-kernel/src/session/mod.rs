//! Session state
//!
//! The live aggregate the display layer reads: phase, log stream, the
//! optional result and the query of the current run. All mutation goes
//! through [`SessionState`], which serializes writers behind one lock and
//! publishes a fresh [`SessionSnapshot`] after every change.
//!
//! Each submission bumps the run generation. Work belonging to an older
//! generation is inert: [`SessionState::with_run`] refuses it.

use crate::state_machine::{path_to_idle, validate_transition};
use aletheia_core::{
    narration, Agent, AnalysisResult, LogEntry, LogStream, Phase, RunError, StateError,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

/// Run generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    /// Raw generation number
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// Mutable session aggregate
///
/// Only reachable through [`SessionState`], so every mutation happens
/// under the session lock.
#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    log: LogStream,
    result: Option<AnalysisResult>,
    query: Option<String>,
    generation: RunId,
}

impl Session {
    /// Current phase
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> RunId {
        self.generation
    }

    /// Log stream of the current run
    #[inline]
    #[must_use]
    pub fn log(&self) -> &LogStream {
        &self.log
    }

    /// Move to `to` along a legal edge
    ///
    /// # Errors
    /// - `StateError::IllegalTransition` if the edge does not exist
    pub fn transition(&mut self, to: Phase) -> Result<(), StateError> {
        let from = self.phase;
        validate_transition(from, to)?;
        self.phase = to;
        tracing::info!(generation = self.generation.get(), %from, %to, "phase transition");
        Ok(())
    }

    /// Append a narration entry
    pub fn narrate(&mut self, agent: Agent, message: impl Into<String>) {
        let entry = self.log.record(agent, message);
        tracing::debug!(
            generation = self.generation.get(),
            agent = %entry.agent(),
            message = entry.message(),
            "narration"
        );
    }

    /// Store the result and settle in `Complete`
    ///
    /// # Errors
    /// - `StateError::IllegalTransition` unless currently synthesizing
    pub fn complete(&mut self, result: AnalysisResult) -> Result<(), StateError> {
        self.transition(Phase::Complete)?;
        self.result = Some(result);
        Ok(())
    }

    /// Record the terminal failure entry and fall back to `Idle`
    ///
    /// # Errors
    /// - `StateError::IllegalTransition` unless a run is in progress
    pub fn fail(&mut self, error: &RunError) -> Result<(), StateError> {
        validate_transition(self.phase, Phase::Idle)?;
        self.narrate(Agent::System, narration::failure(error.kind()));
        self.result = None;
        self.transition(Phase::Idle)
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            entries: self.log.entries().to_vec(),
            result: self.result.clone(),
            query: self.query.clone(),
            generation: self.generation,
        }
    }
}

/// Read-only copy of the session handed to the display layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Current phase
    pub phase: Phase,
    /// Log entries in display order
    pub entries: Vec<LogEntry>,
    /// Present only once complete
    pub result: Option<AnalysisResult>,
    /// Query of the current run
    pub query: Option<String>,
    /// Run generation
    pub generation: RunId,
}

impl SessionSnapshot {
    /// Entry messages in display order
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(LogEntry::message).collect()
    }
}

/// Shared, observable session
#[derive(Debug)]
pub struct SessionState {
    inner: Mutex<Session>,
    updates: watch::Sender<SessionSnapshot>,
}

impl SessionState {
    /// Create an idle session with an empty log
    #[must_use]
    pub fn new() -> Self {
        let session = Session::default();
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            inner: Mutex::new(session),
            updates,
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock().snapshot()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> RunId {
        self.inner.lock().generation
    }

    /// Stored result, if complete
    #[must_use]
    pub fn result(&self) -> Option<AnalysisResult> {
        self.inner.lock().result.clone()
    }

    /// Receive a snapshot after every mutation
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Reset for a new submission and enter `Scanning`
    ///
    /// Walks back to `Idle` first when a run is in progress or complete,
    /// then clears the log and result and appends the start entry.
    ///
    /// # Errors
    /// - `StateError` if the walk back to `Idle` fails
    pub fn begin_run(&self, query: &str) -> Result<RunId, StateError> {
        self.mutate(|session| {
            for step in path_to_idle(session.phase) {
                session.transition(step)?;
            }
            session.generation = session.generation.next();
            session.log.clear();
            session.result = None;
            session.query = Some(query.to_string());
            session.transition(Phase::Scanning)?;
            session.narrate(Agent::System, narration::initiation(query));
            Ok(session.generation)
        })
    }

    /// Run `f` if `run` is still the live run
    ///
    /// Returns `None` without calling `f` once a newer run has started or
    /// this run has settled.
    pub fn with_run<R>(&self, run: RunId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut session = self.inner.lock();
        if session.generation != run || !session.phase.is_working() {
            tracing::debug!(
                generation = run.get(),
                current = session.generation.get(),
                phase = %session.phase,
                "suppressed stale update"
            );
            return None;
        }
        let out = f(&mut *session);
        self.updates.send_replace(session.snapshot());
        Some(out)
    }

    /// Leave `Complete` for `Idle`, dropping the result
    ///
    /// # Errors
    /// - `StateError::IllegalTransition` unless currently complete
    pub fn return_to_idle(&self) -> Result<(), StateError> {
        self.mutate(|session| {
            if session.phase != Phase::Complete {
                return Err(StateError::IllegalTransition {
                    from: session.phase,
                    to: Phase::Idle,
                });
            }
            session.transition(Phase::Idle)?;
            session.result = None;
            Ok(())
        })
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.inner.lock();
        let out = f(&mut *session);
        self.updates.send_replace(session.snapshot());
        out
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aletheia_core::ProviderError;
    use pretty_assertions::assert_eq;

    #[test]
    fn starts_idle_and_empty() {
        let state = SessionState::new();
        let snap = state.snapshot();
        assert_eq!(snap.phase, Phase::Idle);
        assert!(snap.entries.is_empty());
        assert!(snap.result.is_none());
        assert_eq!(snap.generation, RunId::default());
    }

    #[test]
    fn begin_run_resets_and_scans() {
        let state = SessionState::new();
        let run = state.begin_run("AI wrappers").unwrap();

        let snap = state.snapshot();
        assert_eq!(snap.phase, Phase::Scanning);
        assert_eq!(snap.generation, run);
        assert_eq!(snap.query.as_deref(), Some("AI wrappers"));
        assert_eq!(
            snap.messages(),
            vec!["Initiating dialectic sequence for target: \"AI wrappers\""]
        );
    }

    #[test]
    fn new_run_makes_old_generation_inert() {
        let state = SessionState::new();
        let first = state.begin_run("one").unwrap();
        let second = state.begin_run("two").unwrap();
        assert_ne!(first, second);

        let called = state.with_run(first, |s| s.narrate(Agent::Consensus, "stale"));
        assert!(called.is_none());
        assert_eq!(state.snapshot().entries.len(), 1);

        state
            .with_run(second, |s| s.narrate(Agent::Consensus, "fresh"))
            .unwrap();
        assert_eq!(state.snapshot().messages()[1], "fresh");
    }

    #[test]
    fn fail_appends_entry_and_idles() {
        let state = SessionState::new();
        let run = state.begin_run("q").unwrap();
        let err = RunError::from(ProviderError::Network("reset".into()));

        state.with_run(run, |s| s.fail(&err)).unwrap().unwrap();

        let snap = state.snapshot();
        assert_eq!(snap.phase, Phase::Idle);
        assert!(snap.result.is_none());
        assert_eq!(
            snap.messages().last().copied(),
            Some("CRITICAL ERROR: Connection severed or data malformed. (connection severed)")
        );
        // Settled runs accept no further updates
        assert!(state.with_run(run, |_| ()).is_none());
    }

    #[test]
    fn complete_requires_synthesizing() {
        let state = SessionState::new();
        let run = state.begin_run("q").unwrap();
        let err = state
            .with_run(run, |s| s.complete(AnalysisResult::default()))
            .unwrap()
            .unwrap_err();
        assert_eq!(
            err,
            StateError::IllegalTransition {
                from: Phase::Scanning,
                to: Phase::Complete
            }
        );
    }

    #[test]
    fn return_to_idle_only_from_complete() {
        let state = SessionState::new();
        assert!(state.return_to_idle().is_err());

        let run = state.begin_run("q").unwrap();
        assert!(state.return_to_idle().is_err());
        assert_eq!(state.phase(), Phase::Scanning);

        state
            .with_run(run, |s| {
                s.transition(Phase::SkepticReview)?;
                s.transition(Phase::Synthesizing)?;
                s.complete(AnalysisResult::default())
            })
            .unwrap()
            .unwrap();
        assert!(state.result().is_some());

        state.return_to_idle().unwrap();
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.result().is_none());
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let state = SessionState::new();
        let mut rx = state.subscribe();
        assert!(!rx.has_changed().unwrap());

        state.begin_run("q").unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, Phase::Scanning);
    }
}
