//! Supervisor: background task that runs check cycles.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info};

use drowse_core::{Action, Config, PlanError, PlanResult, PlanningErrorPolicy};
use drowse_plan::Planner;

use crate::dispatch::Dispatcher;

/// Why the supervisor stopped on its own.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("check cycle failed: {0}")]
    Planning(#[from] PlanError),

    #[error("supervisor task failed: {0}")]
    Task(String),
}

/// Runs the check loop and remembers the most recently planned action.
pub struct Supervisor {
    planner: Arc<dyn Planner>,
    dispatcher: Arc<dyn Dispatcher>,
    check_interval: Duration,
    policy: PlanningErrorPolicy,
    /// Action recorded by the last cycle to finish planning.
    last_action: Mutex<Action>,
}

impl Supervisor {
    pub fn new(planner: Arc<dyn Planner>, dispatcher: Arc<dyn Dispatcher>, config: &Config) -> Self {
        Self {
            planner,
            dispatcher,
            check_interval: config.check_interval,
            policy: config.planning_error_policy,
            last_action: Mutex::new(Action::NoOp),
        }
    }

    pub fn last_action(&self) -> Action {
        *self.lock_last_action()
    }

    /// Run one check cycle.
    ///
    /// Dispatches only when the planned action differs from the previously
    /// recorded one. Comparing, dispatching and recording happen under one
    /// lock, so overlapping cycles never dispatch the same change twice.
    /// A failed cycle leaves the previous action untouched.
    pub async fn check(&self) -> PlanResult<Action> {
        debug!("performing check");

        let next_action = self.planner.plan().await?;
        debug!(%next_action, "next action is: {next_action}");

        let mut last_action = self.lock_last_action();
        let current_action = *last_action;
        if next_action != current_action {
            info!(
                %current_action,
                %next_action,
                "planned action has changed from {current_action} to {next_action}"
            );
            self.dispatcher.dispatch(next_action);
        }
        *last_action = next_action;

        Ok(next_action)
    }

    /// Spawn the check loop. The first cycle runs one interval from now.
    pub fn start(self) -> SupervisorHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(
            phase = "start",
            interval_secs = self.check_interval.as_secs(),
            "creating supervisor (checking every {} seconds)",
            self.check_interval.as_secs()
        );

        let task = tokio::spawn(Arc::new(self).run(shutdown_rx));
        SupervisorHandle { shutdown_tx, task }
    }

    /// Each tick spawns its own cycle; a cycle stuck on a remote call does
    /// not hold back later ticks.
    async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<(), SupervisorError> {
        let period = self.check_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        let mut cycles = JoinSet::new();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    debug!(in_flight = cycles.len(), "supervisor loop shutting down");
                    // In-flight cycles finish on their own.
                    cycles.detach_all();
                    return Ok(());
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    let outcome = joined.map_err(|e| SupervisorError::Task(e.to_string()))?;
                    if let Err(e) = outcome {
                        match self.policy {
                            PlanningErrorPolicy::Terminate => {
                                error!(error = %e, "check cycle failed, terminating supervisor");
                                return Err(e.into());
                            }
                            PlanningErrorPolicy::LogAndContinue => {
                                error!(error = %e, "check cycle failed, retrying on next tick");
                            }
                        }
                    }
                }
                _ = ticker.tick() => {
                    let supervisor = self.clone();
                    cycles.spawn(async move { supervisor.check().await });
                }
            }
        }
    }

    fn lock_last_action(&self) -> MutexGuard<'_, Action> {
        self.last_action.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Disposer for a running [`Supervisor`].
///
/// Dropping the handle also stops the loop.
pub struct SupervisorHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), SupervisorError>>,
}

impl SupervisorHandle {
    /// Stop future check cycles. Does not touch the action scheduler or
    /// cycles already in flight.
    pub fn dispose(&self) {
        info!(phase = "finish", "terminating supervisor");
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end, either disposed or stopped by a failure.
    ///
    /// Cancel-safe; must not be called again once it has returned.
    pub async fn wait(&mut self) -> Result<(), SupervisorError> {
        match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) => Err(SupervisorError::Task(e.to_string())),
        }
    }

    /// Like [`wait`](Self::wait), consuming the handle.
    pub async fn join(mut self) -> Result<(), SupervisorError> {
        self.wait().await
    }
}
