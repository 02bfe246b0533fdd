//! Turning a changed plan into scheduler calls.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use drowse_core::{Action, ComputeApi, Config};
use drowse_scheduler::{start_action, stop_action, ActionScheduler};

/// Receives the planned action whenever it changes.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, action: Action);
}

/// Dispatches actions to the [`ActionScheduler`].
pub struct ActionDispatcher {
    scheduler: Arc<ActionScheduler>,
    compute: Arc<dyn ComputeApi>,
    instance_id: String,
    hibernation_enabled: bool,
    stop_timeout: Duration,
}

impl ActionDispatcher {
    pub fn new(scheduler: Arc<ActionScheduler>, compute: Arc<dyn ComputeApi>, config: &Config) -> Self {
        Self {
            scheduler,
            compute,
            instance_id: config.ec2.instance_id.clone(),
            hibernation_enabled: config.ec2.hibernation_enabled,
            stop_timeout: config.stop_timeout,
        }
    }
}

impl Dispatcher for ActionDispatcher {
    fn dispatch(&self, action: Action) {
        debug!(%action, "dispatching action");
        match action {
            Action::NoOp => self.scheduler.disarm(),
            Action::Start => self.scheduler.arm(
                start_action(self.compute.clone(), self.instance_id.clone()),
                Duration::ZERO,
            ),
            Action::ScheduleStop => self.scheduler.arm(
                stop_action(
                    self.compute.clone(),
                    self.instance_id.clone(),
                    self.hibernation_enabled,
                ),
                self.stop_timeout,
            ),
        }
    }
}
