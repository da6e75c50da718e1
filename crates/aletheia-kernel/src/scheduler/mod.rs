//! Event Timeline Scheduler
//!
//! Fires narration callbacks at fixed offsets without blocking the caller.
//! A single driver task owns a deadline-ordered queue, so actions fire in
//! non-decreasing deadline order and ties fire in scheduling order.
//!
//! Cancellation is epoch based: `cancel_all` bumps the epoch before the
//! driver hears about it, so anything queued under an older epoch is inert
//! even if its timer is already due. Callers that need a hard guarantee
//! still guard their actions with their own liveness check, since an
//! action may already be running when `cancel_all` returns.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

type Action = Box<dyn FnOnce() + Send + 'static>;

/// Scheduled action identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(u64);

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "action-{}", self.0)
    }
}

/// Scheduler errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// Action was cancelled before it fired
    #[error("scheduled action cancelled")]
    Cancelled,
    /// Driver task is gone
    #[error("scheduler stopped")]
    Stopped,
}

enum Command {
    Schedule(Entry),
    Cancel(ActionId),
    CancelAll,
}

struct Entry {
    id: ActionId,
    epoch: u64,
    deadline: Instant,
    action: Action,
    fired: oneshot::Sender<()>,
}

/// Handle to one scheduled action
#[derive(Debug)]
pub struct ScheduledHandle {
    id: ActionId,
    commands: mpsc::UnboundedSender<Command>,
    fired: oneshot::Receiver<()>,
    stopped: bool,
}

impl ScheduledHandle {
    /// Action ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> ActionId {
        self.id
    }

    /// Cancel this action if it has not fired yet
    pub fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel(self.id));
    }

    /// Wait until the action has run
    ///
    /// # Errors
    /// - `SchedulerError::Cancelled` if it was cancelled instead
    /// - `SchedulerError::Stopped` if the driver was gone when scheduling
    pub async fn fired(self) -> Result<(), SchedulerError> {
        if self.stopped {
            return Err(SchedulerError::Stopped);
        }
        self.fired.await.map_err(|_| SchedulerError::Cancelled)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Schedule(entry) => write!(f, "Schedule({})", entry.id),
            Command::Cancel(id) => write!(f, "Cancel({id})"),
            Command::CancelAll => f.write_str("CancelAll"),
        }
    }
}

/// Group of handles settled together
#[derive(Debug, Default)]
pub struct NarrationBatch {
    handles: Vec<ScheduledHandle>,
}

impl NarrationBatch {
    /// Create empty batch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handle
    #[inline]
    pub fn push(&mut self, handle: ScheduledHandle) {
        self.handles.push(handle);
    }

    /// Number of handles
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// True when no handles were added
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait until every action has fired or been cancelled
    ///
    /// Returns how many actually fired.
    pub async fn settled(self) -> usize {
        join_all(self.handles.into_iter().map(ScheduledHandle::fired))
            .await
            .into_iter()
            .filter(Result::is_ok)
            .count()
    }
}

impl FromIterator<ScheduledHandle> for NarrationBatch {
    fn from_iter<I: IntoIterator<Item = ScheduledHandle>>(iter: I) -> Self {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}

/// Deadline-ordered timer queue driven by a single task
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct Timeline {
    commands: mpsc::UnboundedSender<Command>,
    epoch: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
    next_id: AtomicU64,
    driver: JoinHandle<()>,
}

impl Timeline {
    /// Create a timeline and spawn its driver
    #[must_use]
    pub fn new() -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let epoch = Arc::new(AtomicU64::new(0));
        let pending = Arc::new(AtomicUsize::new(0));
        let driver = tokio::spawn(drive(rx, Arc::clone(&epoch), Arc::clone(&pending)));
        Self {
            commands,
            epoch,
            pending,
            next_id: AtomicU64::new(0),
            driver,
        }
    }

    /// Run `action` once `delay` has elapsed from now
    pub fn schedule(
        &self,
        delay: Duration,
        action: impl FnOnce() + Send + 'static,
    ) -> ScheduledHandle {
        let id = ActionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (fired_tx, fired_rx) = oneshot::channel();
        let entry = Entry {
            id,
            epoch: self.epoch.load(Ordering::Acquire),
            deadline: Instant::now() + delay,
            action: Box::new(action),
            fired: fired_tx,
        };

        self.pending.fetch_add(1, Ordering::AcqRel);
        let stopped = self.commands.send(Command::Schedule(entry)).is_err();
        if stopped {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!(%id, "timeline driver stopped; action dropped");
        }

        ScheduledHandle {
            id,
            commands: self.commands.clone(),
            fired: fired_rx,
            stopped,
        }
    }

    /// Prevent every not-yet-fired action from running
    ///
    /// Safe to call when nothing is pending.
    pub fn cancel_all(&self) {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let _ = self.commands.send(Command::CancelAll);
        tracing::debug!(epoch, "timeline cancelled");
    }

    /// Actions scheduled but not yet fired or discarded
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

async fn drive(
    mut commands: mpsc::UnboundedReceiver<Command>,
    epoch: Arc<AtomicU64>,
    pending: Arc<AtomicUsize>,
) {
    let mut queue: BTreeMap<(Instant, ActionId), Entry> = BTreeMap::new();

    loop {
        let next_deadline = queue.keys().next().map(|(deadline, _)| *deadline);

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Schedule(entry)) => {
                    if entry.epoch == epoch.load(Ordering::Acquire) {
                        queue.insert((entry.deadline, entry.id), entry);
                    } else {
                        pending.fetch_sub(1, Ordering::AcqRel);
                    }
                }
                Some(Command::Cancel(id)) => {
                    let before = queue.len();
                    queue.retain(|(_, entry_id), _| *entry_id != id);
                    pending.fetch_sub(before - queue.len(), Ordering::AcqRel);
                }
                Some(Command::CancelAll) => {
                    let current = epoch.load(Ordering::Acquire);
                    let before = queue.len();
                    queue.retain(|_, entry| entry.epoch == current);
                    pending.fetch_sub(before - queue.len(), Ordering::AcqRel);
                }
                None => break,
            },

            () = wait_for(next_deadline) => {
                let now = Instant::now();
                while let Some(entry) = queue.first_entry() {
                    if entry.key().0 > now {
                        break;
                    }
                    let entry = entry.remove();
                    pending.fetch_sub(1, Ordering::AcqRel);
                    if entry.epoch != epoch.load(Ordering::Acquire) {
                        tracing::debug!(id = %entry.id, "skipping stale action");
                        continue;
                    }
                    (entry.action)();
                    let _ = entry.fired.send(());
                }
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Action) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let make = move |label: &'static str| -> Action {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().push(label))
        };
        (seen, make)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_in_deadline_order() {
        let timeline = Timeline::new();
        let (seen, make) = recorder();

        let batch: NarrationBatch = [("late", 300), ("early", 100), ("middle", 200)]
            .into_iter()
            .map(|(label, ms)| timeline.schedule(Duration::from_millis(ms), make(label)))
            .collect();

        assert_eq!(batch.settled().await, 3);
        assert_eq!(*seen.lock(), vec!["early", "middle", "late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn ties_fire_in_scheduling_order() {
        let timeline = Timeline::new();
        let (seen, make) = recorder();

        let batch: NarrationBatch = ["a", "b", "c", "d"]
            .into_iter()
            .map(|label| timeline.schedule(Duration::from_millis(50), make(label)))
            .collect();

        batch.settled().await;
        assert_eq!(*seen.lock(), vec!["a", "b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_does_not_block_caller() {
        let timeline = Timeline::new();
        let (seen, make) = recorder();

        let start = Instant::now();
        let handle = timeline.schedule(Duration::from_secs(10), make("x"));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(seen.lock().is_empty());

        handle.fired().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_prevents_pending_actions() {
        let timeline = Timeline::new();
        let (seen, make) = recorder();

        let first = timeline.schedule(Duration::from_millis(100), make("stale"));
        let second = timeline.schedule(Duration::from_millis(200), make("stale"));
        timeline.cancel_all();
        let fresh = timeline.schedule(Duration::from_millis(150), make("fresh"));

        assert_eq!(first.fired().await, Err(SchedulerError::Cancelled));
        assert_eq!(second.fired().await, Err(SchedulerError::Cancelled));
        fresh.fired().await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(*seen.lock(), vec!["fresh"]);
        assert_eq!(timeline.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_with_nothing_pending_is_noop() {
        let timeline = Timeline::new();
        timeline.cancel_all();
        timeline.cancel_all();
        assert_eq!(timeline.pending(), 0);

        let (seen, make) = recorder();
        timeline
            .schedule(Duration::from_millis(10), make("after"))
            .fired()
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec!["after"]);
    }

    #[tokio::test(start_paused = true)]
    async fn single_cancel_leaves_others() {
        let timeline = Timeline::new();
        let (seen, make) = recorder();

        let keep = timeline.schedule(Duration::from_millis(100), make("keep"));
        let drop_me = timeline.schedule(Duration::from_millis(50), make("drop"));
        drop_me.cancel();

        assert_eq!(drop_me.fired().await, Err(SchedulerError::Cancelled));
        keep.fired().await.unwrap();
        assert_eq!(*seen.lock(), vec!["keep"]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_fires() {
        let timeline = Timeline::new();
        let (seen, make) = recorder();
        timeline
            .schedule(Duration::ZERO, make("now"))
            .fired()
            .await
            .unwrap();
        assert_eq!(*seen.lock(), vec!["now"]);
    }
}
