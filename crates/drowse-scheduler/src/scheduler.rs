//! Action scheduler: one cancellable timer slot.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use drowse_core::BoxFuture;

use crate::retry::{RetryPolicy, MAX_RETRY_DELAY};

/// An action the scheduler can run, possibly many times on retry.
pub type ActionFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as an [`ActionFn`].
pub fn action_fn<F, Fut>(f: F) -> ActionFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Snapshot of the armed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStatus {
    /// Delay the timer was (re-)armed with.
    pub delay: Duration,
    /// Failed executions of this action so far.
    pub failures: u32,
}

/// The single timer slot.
struct Slot {
    generation: u64,
    status: SlotStatus,
    /// Dropping this cancels the pending sleep of the slot's task.
    cancel_tx: watch::Sender<bool>,
    /// Detached on replacement: an action already running is never aborted.
    _handle: JoinHandle<()>,
}

type SharedSlot = Arc<Mutex<Option<Slot>>>;

/// Runs at most one pending start/stop action at a time.
///
/// Every call to [`schedule`](Self::schedule) cancels whatever is pending
/// and optionally arms a new timer; reading, cancelling and installing
/// happen under one lock. Must be called from within a tokio runtime.
pub struct ActionScheduler {
    slot: SharedSlot,
    next_generation: AtomicU64,
    max_retry_delay: Duration,
}

impl ActionScheduler {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            next_generation: AtomicU64::new(1),
            max_retry_delay: MAX_RETRY_DELAY,
        }
    }

    /// Override the backoff cap.
    pub fn with_max_retry_delay(mut self, max_retry_delay: Duration) -> Self {
        self.max_retry_delay = max_retry_delay;
        self
    }

    /// Cancel the pending timer, then arm `action` after `delay` if given.
    pub fn schedule(&self, action: Option<ActionFn>, delay: Duration) {
        let mut slot = lock(&self.slot);

        if let Some(old) = slot.take() {
            info!(generation = old.generation, "cancelling previously scheduled action");
            let _ = old.cancel_tx.send(true);
        }

        let Some(action) = action else {
            return;
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let policy = RetryPolicy::new(delay).with_max_delay(self.max_retry_delay);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        info!(
            generation,
            delay_secs = delay.as_secs_f64(),
            "will execute next action in {} seconds",
            delay.as_secs()
        );

        let handle = tokio::spawn(run_slot(
            self.slot.clone(),
            generation,
            action,
            policy,
            cancel_rx,
        ));

        *slot = Some(Slot {
            generation,
            status: SlotStatus { delay, failures: 0 },
            cancel_tx,
            _handle: handle,
        });
    }

    /// Arm `action` to run after `delay`, replacing anything pending.
    pub fn arm(&self, action: ActionFn, delay: Duration) {
        self.schedule(Some(action), delay);
    }

    /// Cancel any pending action and leave the slot empty.
    pub fn disarm(&self) {
        self.schedule(None, Duration::ZERO);
    }

    /// Whether an action is currently armed or running in the slot.
    pub fn is_armed(&self) -> bool {
        lock(&self.slot).is_some()
    }

    pub fn status(&self) -> Option<SlotStatus> {
        lock(&self.slot).as_ref().map(|slot| slot.status)
    }
}

impl Default for ActionScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(slot: &SharedSlot) -> MutexGuard<'_, Option<Slot>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drive one armed action until it succeeds or is superseded.
async fn run_slot(
    slot: SharedSlot,
    generation: u64,
    action: ActionFn,
    mut policy: RetryPolicy,
    mut cancel: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            // Fires on cancel and when the sender is dropped.
            _ = cancel.changed() => {
                debug!(generation, "scheduled action cancelled before firing");
                return;
            }
            _ = tokio::time::sleep(policy.current_delay()) => {}
        }

        info!(generation, attempt = policy.failures() + 1, "executing scheduled action");

        match action().await {
            Ok(()) => {
                info!(generation, result = "ok", "execution of scheduled action successful");
                let mut guard = lock(&slot);
                if guard.as_ref().is_some_and(|s| s.generation == generation) {
                    *guard = None;
                }
                return;
            }
            Err(e) => {
                warn!(generation, error = %format!("{e:#}"), "execution of scheduled action threw an error");

                let retry = policy.backoff();
                let mut guard = lock(&slot);
                match guard.as_mut() {
                    Some(current) if current.generation == generation => {
                        current.status = SlotStatus {
                            delay: retry,
                            failures: policy.failures(),
                        };
                    }
                    _ => {
                        debug!(generation, "action superseded while running, not retrying");
                        return;
                    }
                }
                info!(
                    generation,
                    retry_secs = retry.as_secs(),
                    "retry scheduled in {} seconds",
                    retry.as_secs()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn counting(calls: &Arc<AtomicUsize>) -> ActionFn {
        let calls = calls.clone();
        action_fn(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn failing(calls: &Arc<AtomicUsize>) -> ActionFn {
        let calls = calls.clone();
        action_fn(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("oh no!"))
            }
        })
    }

    fn count(calls: &Arc<AtomicUsize>) -> usize {
        calls.load(Ordering::SeqCst)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_after_the_next_tick() {
        let scheduler = ActionScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Some(counting(&calls)), Duration::ZERO);
        assert_eq!(count(&calls), 0);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(count(&calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn runs_after_the_given_delay() {
        let scheduler = ActionScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));

        scheduler.arm(counting(&calls), secs(10));

        sleep(secs(5)).await;
        assert_eq!(count(&calls), 0);
        assert!(scheduler.is_armed());

        sleep(Duration::from_millis(5100)).await;
        assert_eq!(count(&calls), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_clears_the_slot() {
        let scheduler = ActionScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));

        scheduler.arm(counting(&calls), secs(1));
        assert_eq!(
            scheduler.status(),
            Some(SlotStatus { delay: secs(1), failures: 0 })
        );

        sleep(secs(2)).await;
        assert_eq!(count(&calls), 1);
        assert!(!scheduler.is_armed());
        assert_eq!(scheduler.status(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn later_schedule_cancels_pending_action() {
        let scheduler = ActionScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Some(counting(&first)), secs(10));
        scheduler.schedule(Some(counting(&second)), Duration::ZERO);

        sleep(Duration::from_millis(10_100)).await;
        assert_eq!(count(&first), 0);
        assert_eq!(count(&second), 1);

        scheduler.schedule(Some(counting(&first)), secs(10));
        scheduler.schedule(None, Duration::ZERO);
        assert!(!scheduler.is_armed());

        sleep(Duration::from_millis(10_100)).await;
        assert_eq!(count(&first), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_is_idempotent() {
        let scheduler = ActionScheduler::new();
        scheduler.disarm();
        scheduler.disarm();
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_retries_with_capped_backoff() {
        let scheduler = ActionScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));

        scheduler.arm(failing(&calls), secs(10));

        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(count(&calls), 1);
        assert_eq!(
            scheduler.status(),
            Some(SlotStatus { delay: secs(15), failures: 1 })
        );

        sleep(secs(15)).await;
        assert_eq!(count(&calls), 2);
        assert_eq!(
            scheduler.status(),
            Some(SlotStatus { delay: secs(15), failures: 2 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_failure_backs_off_from_one_second() {
        let scheduler = ActionScheduler::new();
        let calls = Arc::new(AtomicUsize::new(0));

        scheduler.arm(failing(&calls), Duration::ZERO);

        sleep(Duration::from_millis(10)).await;
        assert_eq!(count(&calls), 1);
        assert_eq!(scheduler.status().map(|s| s.delay), Some(secs(1)));

        sleep(secs(1)).await;
        assert_eq!(count(&calls), 2);
        assert_eq!(scheduler.status().map(|s| s.delay), Some(secs(2)));

        sleep(secs(2)).await;
        assert_eq!(count(&calls), 3);
        assert_eq!(scheduler.status().map(|s| s.delay), Some(secs(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_the_slot_stops_retries() {
        let scheduler = ActionScheduler::new();
        let failed = Arc::new(AtomicUsize::new(0));
        let replacement = Arc::new(AtomicUsize::new(0));

        scheduler.arm(failing(&failed), Duration::ZERO);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(count(&failed), 1);

        scheduler.arm(counting(&replacement), Duration::ZERO);
        sleep(secs(20)).await;

        assert_eq!(count(&failed), 1);
        assert_eq!(count(&replacement), 1);
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn running_action_is_not_aborted() {
        let scheduler = ActionScheduler::new();
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let pending = Arc::new(AtomicUsize::new(0));

        let slow = {
            let started = started.clone();
            let finished = finished.clone();
            action_fn(move || {
                let started = started.clone();
                let finished = finished.clone();
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    sleep(secs(5)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        };

        scheduler.arm(slow, Duration::ZERO);
        sleep(secs(1)).await;
        assert_eq!(count(&started), 1);

        // Superseding mid-flight leaves the running action alone, and its
        // completion does not clear the newer slot.
        scheduler.arm(counting(&pending), secs(60));
        sleep(secs(10)).await;

        assert_eq!(count(&finished), 1);
        assert_eq!(count(&pending), 0);
        assert!(scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn custom_retry_cap_limits_backoff() {
        let scheduler = ActionScheduler::new().with_max_retry_delay(secs(3));
        let calls = Arc::new(AtomicUsize::new(0));

        scheduler.arm(failing(&calls), secs(2));

        sleep(Duration::from_millis(2_100)).await;
        assert_eq!(count(&calls), 1);
        assert_eq!(scheduler.status().map(|s| s.delay), Some(secs(3)));

        sleep(secs(3)).await;
        assert_eq!(count(&calls), 2);
        assert_eq!(scheduler.status().map(|s| s.delay), Some(secs(3)));
    }
}
