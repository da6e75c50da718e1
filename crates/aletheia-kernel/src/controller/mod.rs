//! Analysis Session Controller
//!
//! Owns the session, the narration timeline and at most one active run.
//! A run is a spawned pipeline task plus a supervisor that turns every
//! way the pipeline can end (error, panic, abort) into a settled session.

use crate::scheduler::{NarrationBatch, ScheduledHandle, Timeline};
use crate::session::{RunId, Session, SessionSnapshot, SessionState};
use aletheia_core::{
    narration, normalize, Agent, AnalysisProvider, EngineConfig, Phase, ProviderError, RunError,
    StateError,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinError, JoinHandle};

/// How a submitted run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Settled in `Complete` with a stored result
    Completed,
    /// Settled in `Idle` after logging the failure
    Failed(RunError),
    /// A newer submission took over before this run settled
    Superseded,
}

impl RunOutcome {
    /// True for `Completed`
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Handle to one submitted run
#[derive(Debug)]
pub struct RunHandle {
    run: RunId,
    join: JoinHandle<RunOutcome>,
}

impl RunHandle {
    /// Generation of this run
    #[inline]
    #[must_use]
    pub fn run(&self) -> RunId {
        self.run
    }

    /// Wait until the run settles or is superseded
    pub async fn wait(self) -> RunOutcome {
        self.join.await.unwrap_or(RunOutcome::Superseded)
    }
}

struct ActiveRun {
    run: RunId,
    abort: AbortHandle,
}

struct Inner {
    provider: Arc<dyn AnalysisProvider>,
    config: EngineConfig,
    session: Arc<SessionState>,
    timeline: Timeline,
    active: Mutex<Option<ActiveRun>>,
}

/// Drives analysis runs against one session
///
/// Must be created inside a tokio runtime.
pub struct AnalysisController {
    inner: Arc<Inner>,
}

impl AnalysisController {
    /// Create a controller around `provider`
    #[must_use]
    pub fn new(provider: impl AnalysisProvider + 'static, config: EngineConfig) -> Self {
        Self::with_shared_provider(Arc::new(provider), config)
    }

    /// Create a controller around an already shared provider
    #[must_use]
    pub fn with_shared_provider(provider: Arc<dyn AnalysisProvider>, config: EngineConfig) -> Self {
        tracing::debug!(provider = provider.name(), "controller created");
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                session: Arc::new(SessionState::new()),
                timeline: Timeline::new(),
                active: Mutex::new(None),
            }),
        }
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Observable session
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    /// Current snapshot
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.snapshot()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.session.phase()
    }

    /// Receive a snapshot after every session mutation
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.session.subscribe()
    }

    /// Start a run for `query`
    ///
    /// A blank query changes nothing and returns `None`. Submitting while a
    /// run is in progress cancels that run and starts over.
    pub fn submit(&self, query: &str) -> Option<RunHandle> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("ignoring empty query");
            return None;
        }

        let mut active = self.inner.active.lock();
        self.inner.timeline.cancel_all();
        if let Some(previous) = active.take() {
            tracing::info!(generation = previous.run.get(), "superseding active run");
            previous.abort.abort();
        }

        let run = match self.inner.session.begin_run(query) {
            Ok(run) => run,
            Err(e) => {
                tracing::error!(error = %e, "failed to start run");
                return None;
            }
        };
        tracing::info!(generation = run.get(), query, "run submitted");

        let pipeline = tokio::spawn(run_pipeline(Arc::clone(&self.inner), run, query.to_string()));
        *active = Some(ActiveRun {
            run,
            abort: pipeline.abort_handle(),
        });
        drop(active);

        let join = tokio::spawn(supervise(Arc::clone(&self.inner), run, pipeline));
        Some(RunHandle { run, join })
    }

    /// Leave `Complete` for `Idle`
    ///
    /// # Errors
    /// - `StateError::IllegalTransition` unless the session is complete
    pub fn return_to_idle(&self) -> Result<(), StateError> {
        self.inner.session.return_to_idle()
    }
}

impl Drop for AnalysisController {
    fn drop(&mut self) {
        self.inner.timeline.cancel_all();
        if let Some(active) = self.inner.active.lock().take() {
            active.abort.abort();
        }
    }
}

impl std::fmt::Debug for AnalysisController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisController")
            .field("provider", &self.inner.provider.name())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Schedule a narration entry guarded by run liveness
    fn narrate_at(
        &self,
        run: RunId,
        offset: Duration,
        agent: Agent,
        message: String,
    ) -> ScheduledHandle {
        let session = Arc::clone(&self.session);
        self.timeline.schedule(offset, move || {
            session.with_run(run, |s| s.narrate(agent, message));
        })
    }

    /// Apply `f` to the session if `run` is still live
    fn step(
        &self,
        run: RunId,
        f: impl FnOnce(&mut Session) -> Result<(), StateError>,
    ) -> Result<(), RunError> {
        self.session
            .with_run(run, f)
            .ok_or(RunError::Superseded)?
            .map_err(RunError::from)
    }

    /// Settle a failed run in `Idle`
    ///
    /// Returns false when the run was no longer live.
    fn fail(&self, run: RunId, error: &RunError) -> bool {
        let active = self.active.lock();
        if self.session.generation() != run {
            return false;
        }
        self.timeline.cancel_all();
        let settled = matches!(self.session.with_run(run, |s| s.fail(error)), Some(Ok(())));
        drop(active);

        if settled {
            tracing::error!(generation = run.get(), error = %error, "run failed");
        }
        settled
    }
}

async fn run_pipeline(inner: Arc<Inner>, run: RunId, query: String) -> Result<(), RunError> {
    let timeline = &inner.config.timeline;

    let scan: NarrationBatch = timeline
        .scan_offsets()
        .into_iter()
        .zip(narration::SCAN_NARRATION)
        .map(|(offset, line)| inner.narrate_at(run, offset, Agent::Consensus, line.to_string()))
        .collect();

    let budget = inner.config.provider_timeout();
    let raw = match tokio::time::timeout(budget, inner.provider.analyze(&query)).await {
        Ok(outcome) => outcome?,
        Err(_) => {
            return Err(ProviderError::Timeout {
                duration_secs: inner.config.provider_timeout_secs,
            }
            .into())
        }
    };
    if !raw.is_object() {
        return Err(RunError::MalformedResult(
            "payload is not a JSON object".to_string(),
        ));
    }
    let result = normalize(&raw);
    tracing::debug!(
        generation = run.get(),
        fallacies = result.skeptic.fallacies.len(),
        "payload normalized"
    );

    scan.settled().await;
    inner.step(run, |s| {
        s.narrate(Agent::Consensus, narration::theme(&result.consensus.theme));
        s.narrate(
            Agent::Consensus,
            narration::saturation(result.consensus.market_saturation.value()),
        );
        s.transition(Phase::SkepticReview)?;
        s.narrate(Agent::Skeptic, narration::SKEPTIC_ENGAGED);
        Ok(())
    })?;
    tokio::time::sleep(timeline.skeptic_settle()).await;

    let fallacies = &result.skeptic.fallacies;
    let mut review: NarrationBatch = fallacies
        .iter()
        .enumerate()
        .map(|(i, fallacy)| {
            inner.narrate_at(
                run,
                timeline.fallacy_offset(i, fallacies.len()),
                Agent::Skeptic,
                narration::fallacy(fallacy),
            )
        })
        .collect();
    review.push(inner.narrate_at(
        run,
        timeline.stagnation_offset(),
        Agent::Skeptic,
        narration::stagnation(&result.skeptic.stagnation_point),
    ));
    tokio::time::sleep(timeline.skeptic_review()).await;
    review.settled().await;

    inner.step(run, |s| {
        s.transition(Phase::Synthesizing)?;
        for line in narration::SYNTHESIS_NARRATION {
            s.narrate(Agent::Synthesizer, line);
        }
        Ok(())
    })?;
    tokio::time::sleep(timeline.synthesis_settle()).await;

    inner.step(run, move |s| {
        s.complete(result)?;
        s.narrate(Agent::System, narration::COMPLETED);
        Ok(())
    })?;
    tracing::info!(generation = run.get(), "run complete");
    Ok(())
}

async fn supervise(
    inner: Arc<Inner>,
    run: RunId,
    pipeline: JoinHandle<Result<(), RunError>>,
) -> RunOutcome {
    let outcome = match pipeline.await {
        Ok(Ok(())) => RunOutcome::Completed,
        Ok(Err(RunError::Superseded)) => RunOutcome::Superseded,
        Ok(Err(error)) => settle_failure(&inner, run, error),
        Err(e) if e.is_cancelled() => RunOutcome::Superseded,
        Err(e) => settle_failure(&inner, run, RunError::Internal(panic_message(e))),
    };

    let mut active = inner.active.lock();
    if active.as_ref().is_some_and(|a| a.run == run) {
        *active = None;
    }
    outcome
}

fn settle_failure(inner: &Inner, run: RunId, error: RunError) -> RunOutcome {
    if inner.fail(run, &error) {
        RunOutcome::Failed(error)
    } else {
        RunOutcome::Superseded
    }
}

fn panic_message(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "pipeline panicked".to_string()),
        Err(e) => e.to_string(),
    }
}
