//! Action planner: the decision table.

use tracing::debug;

use drowse_core::{Action, InstanceState, QueueState};

/// Decide the next action for a queue/instance state pair.
///
/// The instance is only started from `stopping`/`stopped`, never while it
/// is already coming up or shutting down, and stops are only ever
/// scheduled so in-flight builds get a grace window. `terminated` and
/// `shutting-down` never produce an action.
pub fn next_action(queue: QueueState, instance: InstanceState) -> Action {
    use InstanceState as I;

    let action = match (queue, instance) {
        (QueueState::Empty, I::Pending | I::Running) => Action::ScheduleStop,
        (QueueState::Pending | QueueState::Running, I::Stopping | I::Stopped) => Action::Start,
        (QueueState::Empty, I::ShuttingDown | I::Terminated | I::Stopping | I::Stopped)
        | (
            QueueState::Pending | QueueState::Running,
            I::Pending | I::Running | I::ShuttingDown | I::Terminated,
        ) => Action::NoOp,
    };

    debug!(
        phase = "finish",
        queue_state = %queue,
        instance_state = %instance,
        next_action = %action,
        "determined next action"
    );
    action
}
