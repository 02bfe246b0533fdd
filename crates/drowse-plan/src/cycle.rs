//! One planning pass against the live queue and instance.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};

use drowse_core::{
    Action, BoxFuture, ComputeApi, Config, InstanceDescriptor, InstanceState, PlanError,
    PlanResult, QueueItem, QueueSource,
};

use crate::classify::{classify_instance, classify_queue};
use crate::planner::next_action;

/// Produces the next action for one check cycle.
///
/// The supervisor only depends on this seam, so its edge-triggering can be
/// tested without any remote calls.
pub trait Planner: Send + Sync {
    fn plan(&self) -> BoxFuture<'_, PlanResult<Action>>;
}

/// Plans from the remote queue and instance state.
pub struct RemotePlanner {
    queue: Arc<dyn QueueSource>,
    compute: Arc<dyn ComputeApi>,
    instance_id: String,
    ignore_running_for: Option<Duration>,
    /// Current unix time in seconds.
    clock: fn() -> u64,
}

impl RemotePlanner {
    pub fn new(queue: Arc<dyn QueueSource>, compute: Arc<dyn ComputeApi>, config: &Config) -> Self {
        Self {
            queue,
            compute,
            instance_id: config.ec2.instance_id.clone(),
            ignore_running_for: config.drone.ignore_running_for,
            clock: epoch_secs,
        }
    }

    /// Replace the wall clock used for queue age filtering.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Fetch both remote states concurrently, classify, and decide.
    pub async fn plan_once(&self) -> PlanResult<Action> {
        let (queue, instance) = tokio::try_join!(self.fetch_queue(), self.describe_instance())?;

        let queue_state = classify_queue(&queue, self.ignore_running_for, (self.clock)())?;
        let instance_state = classify_instance(&instance)?;

        if instance_state == InstanceState::Terminated {
            return Err(PlanError::Terminated {
                instance_id: self.instance_id.clone(),
            });
        }

        Ok(next_action(queue_state, instance_state))
    }

    async fn fetch_queue(&self) -> PlanResult<Vec<QueueItem>> {
        debug!(phase = "start", "fetching queue");
        let queue = self.queue.fetch_queue().await.map_err(PlanError::QueueFetch)?;
        debug!(phase = "finish", queue_length = queue.len(), "fetched queue");
        trace!(?queue);
        Ok(queue)
    }

    async fn describe_instance(&self) -> PlanResult<InstanceDescriptor> {
        debug!(phase = "start", instance_id = %self.instance_id, "describing instance");
        let instance = self
            .compute
            .describe(&self.instance_id)
            .await
            .map_err(PlanError::InstanceFetch)?;
        debug!(phase = "finish", instance_id = %self.instance_id, "described instance");
        trace!(?instance);
        Ok(instance)
    }
}

impl Planner for RemotePlanner {
    fn plan(&self) -> BoxFuture<'_, PlanResult<Action>> {
        Box::pin(self.plan_once())
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
