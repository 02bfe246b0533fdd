//! Queue and instance classifiers.
//!
//! Both are total: every input maps to exactly one state or to an error,
//! never to a silent default.

use std::time::Duration;

use tracing::debug;

use drowse_core::{InstanceDescriptor, InstanceState, PlanError, PlanResult, QueueItem, QueueState, QueueStatus};

/// Classify a queue snapshot.
///
/// `ignore_running_for` is the staleness window: a running item created at
/// least that long before `now` (unix seconds) no longer counts as
/// activity. Running work dominates pending work.
pub fn classify_queue(
    queue: &[QueueItem],
    ignore_running_for: Option<Duration>,
    now: u64,
) -> PlanResult<QueueState> {
    if let Some(item) = queue
        .iter()
        .find(|item| matches!(item.status, QueueStatus::Other(_)))
    {
        return Err(PlanError::Classification {
            status: String::from(item.status.clone()),
        });
    }

    let state = if queue.is_empty() {
        QueueState::Empty
    } else if queue
        .iter()
        .any(|item| is_active_running(item, ignore_running_for, now))
    {
        QueueState::Running
    } else if queue.iter().any(|item| item.status == QueueStatus::Pending) {
        QueueState::Pending
    } else {
        // Only stale running builds left.
        QueueState::Empty
    };

    debug!(
        phase = "finish",
        queue_length = queue.len(),
        determined_state = %state,
        "classified queue"
    );
    Ok(state)
}

fn is_active_running(item: &QueueItem, window: Option<Duration>, now: u64) -> bool {
    if item.status != QueueStatus::Running {
        return false;
    }
    match (window, item.created) {
        (Some(window), Some(created)) => Duration::from_secs(now.saturating_sub(created)) < window,
        // No window, or nothing to age the build by.
        _ => true,
    }
}

/// Classify an instance descriptor into its lifecycle state.
pub fn classify_instance(instance: &InstanceDescriptor) -> PlanResult<InstanceState> {
    let name = instance
        .state
        .as_ref()
        .and_then(|state| state.name.as_deref())
        .ok_or(PlanError::MissingState)?;

    let state: InstanceState = name.parse()?;
    debug!(phase = "finish", determined_state = %state, "classified instance");
    Ok(state)
}
