//! EC2 control-plane client.

use aws_config::BehaviorVersion;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::operation::describe_instances::DescribeInstancesOutput;
use aws_sdk_ec2::types::Instance;
use tracing::{debug, info, trace};

use drowse_core::{BoxFuture, ComputeApi, InstanceDescriptor, StateDescriptor};

/// Describes, starts and stops EC2 instances.
pub struct Ec2Client {
    client: aws_sdk_ec2::Client,
}

impl Ec2Client {
    /// Build a client from the standard AWS environment (region,
    /// credentials chain, profile).
    pub async fn from_env() -> Self {
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest()).load().await;
        info!(
            region = ?aws_cfg.region().map(|r| r.as_ref().to_string()),
            "EC2 client initialised"
        );
        Self::new(aws_sdk_ec2::Client::new(&aws_cfg))
    }

    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }

    pub async fn describe_instance(&self, instance_id: &str) -> anyhow::Result<InstanceDescriptor> {
        debug!(phase = "start", %instance_id, "describing EC2 instance");

        let output = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("DescribeInstances failed: {}", DisplayErrorContext(&e)))?;

        let descriptor = descriptor_for(&output, instance_id)?;
        debug!(phase = "finish", %instance_id, "described EC2 instance");
        Ok(descriptor)
    }

    pub async fn start_instance(&self, instance_id: &str) -> anyhow::Result<()> {
        let output = self
            .client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("StartInstances failed: {}", DisplayErrorContext(&e)))?;
        trace!(changes = ?output.starting_instances(), "start requested");
        Ok(())
    }

    pub async fn stop_instance(&self, instance_id: &str, hibernate: bool) -> anyhow::Result<()> {
        let output = self
            .client
            .stop_instances()
            .instance_ids(instance_id)
            .hibernate(hibernate)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("StopInstances failed: {}", DisplayErrorContext(&e)))?;
        trace!(changes = ?output.stopping_instances(), "stop requested");
        Ok(())
    }
}

impl ComputeApi for Ec2Client {
    fn describe<'a>(&'a self, instance_id: &'a str) -> BoxFuture<'a, anyhow::Result<InstanceDescriptor>> {
        Box::pin(self.describe_instance(instance_id))
    }

    fn start<'a>(&'a self, instance_id: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(self.start_instance(instance_id))
    }

    fn stop<'a>(&'a self, instance_id: &'a str, hibernate: bool) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(self.stop_instance(instance_id, hibernate))
    }
}

/// The instance is always the first one in the first reservation.
fn first_instance(output: &DescribeInstancesOutput) -> Option<&Instance> {
    output
        .reservations()
        .first()
        .and_then(|reservation| reservation.instances().first())
}

fn descriptor_for(output: &DescribeInstancesOutput, instance_id: &str) -> anyhow::Result<InstanceDescriptor> {
    let instance = first_instance(output)
        .ok_or_else(|| anyhow::anyhow!("EC2 Instance '{instance_id}' not found"))?;
    trace!(?instance);
    Ok(descriptor_from(instance))
}

fn descriptor_from(instance: &Instance) -> InstanceDescriptor {
    InstanceDescriptor {
        state: instance.state().map(|state| StateDescriptor {
            name: state.name().map(|name| name.as_str().to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{InstanceState, InstanceStateName, Reservation};

    fn instance_in(name: InstanceStateName) -> Instance {
        Instance::builder()
            .instance_id("test-instance")
            .state(InstanceState::builder().name(name).build())
            .build()
    }

    #[test]
    fn descriptor_carries_provider_state_name() {
        let descriptor = descriptor_from(&instance_in(InstanceStateName::ShuttingDown));
        assert_eq!(descriptor, InstanceDescriptor::with_state_name("shutting-down"));
    }

    #[test]
    fn descriptor_without_state_is_empty() {
        let descriptor = descriptor_from(&Instance::builder().build());
        assert_eq!(descriptor, InstanceDescriptor::default());

        let descriptor = descriptor_from(
            &Instance::builder()
                .state(InstanceState::builder().build())
                .build(),
        );
        assert_eq!(descriptor.state, Some(StateDescriptor { name: None }));
    }

    #[test]
    fn first_instance_of_first_reservation() {
        let output = DescribeInstancesOutput::builder()
            .reservations(
                Reservation::builder()
                    .instances(instance_in(InstanceStateName::Running))
                    .instances(instance_in(InstanceStateName::Stopped))
                    .build(),
            )
            .build();

        let instance = first_instance(&output).unwrap();
        assert_eq!(
            descriptor_from(instance),
            InstanceDescriptor::with_state_name("running")
        );
    }

    #[test]
    fn no_reservations_means_no_instance() {
        let output = DescribeInstancesOutput::builder().build();
        assert!(first_instance(&output).is_none());

        let err = descriptor_for(&output, "i-missing").unwrap_err();
        assert_eq!(err.to_string(), "EC2 Instance 'i-missing' not found");
    }

    #[test]
    fn empty_reservation_means_no_instance() {
        let output = DescribeInstancesOutput::builder()
            .reservations(Reservation::builder().build())
            .build();
        assert!(descriptor_for(&output, "i-missing").is_err());
    }
}
