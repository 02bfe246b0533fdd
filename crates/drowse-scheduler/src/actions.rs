//! The two actions the scheduler ever runs: start and stop the instance.

use std::sync::Arc;

use tracing::info;

use drowse_core::ComputeApi;

use crate::scheduler::{action_fn, ActionFn};

/// Start the instance.
pub async fn start(compute: &dyn ComputeApi, instance_id: &str) -> anyhow::Result<()> {
    info!(phase = "start", %instance_id, "starting EC2 instance '{instance_id}'");
    compute.start(instance_id).await?;
    info!(phase = "finish", %instance_id, "started EC2 instance '{instance_id}'");
    Ok(())
}

/// Stop the instance, hibernating it if enabled.
pub async fn stop(
    compute: &dyn ComputeApi,
    instance_id: &str,
    hibernation_enabled: bool,
) -> anyhow::Result<()> {
    info!(phase = "start", %instance_id, hibernation_enabled, "stopping EC2 instance '{instance_id}'");
    compute.stop(instance_id, hibernation_enabled).await?;
    info!(phase = "finish", %instance_id, hibernation_enabled, "stopped EC2 instance '{instance_id}'");
    Ok(())
}

/// [`start`] as a schedulable action.
pub fn start_action(compute: Arc<dyn ComputeApi>, instance_id: String) -> ActionFn {
    action_fn(move || {
        let compute = compute.clone();
        let instance_id = instance_id.clone();
        async move { start(compute.as_ref(), &instance_id).await }
    })
}

/// [`stop`] as a schedulable action.
pub fn stop_action(
    compute: Arc<dyn ComputeApi>,
    instance_id: String,
    hibernation_enabled: bool,
) -> ActionFn {
    action_fn(move || {
        let compute = compute.clone();
        let instance_id = instance_id.clone();
        async move { stop(compute.as_ref(), &instance_id, hibernation_enabled).await }
    })
}
