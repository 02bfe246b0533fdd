//! Call contracts for the two remote systems the core depends on.
//!
//! Implementations live in `drowse-remote`; tests use in-process fakes.
//! Methods return boxed futures so the traits stay object-safe and can be
//! shared as `Arc<dyn ...>` across tasks.

use std::future::Future;
use std::pin::Pin;

use crate::types::{InstanceDescriptor, QueueItem};

/// Boxed, sendable future used by the remote-call traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of CI queue snapshots.
pub trait QueueSource: Send + Sync {
    /// Fetch the current queue.
    fn fetch_queue(&self) -> BoxFuture<'_, anyhow::Result<Vec<QueueItem>>>;
}

/// Control-plane operations on a single compute instance.
pub trait ComputeApi: Send + Sync {
    /// Describe the instance's current state.
    fn describe<'a>(&'a self, instance_id: &'a str)
        -> BoxFuture<'a, anyhow::Result<InstanceDescriptor>>;

    /// Request that the instance be started.
    fn start<'a>(&'a self, instance_id: &'a str) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Request that the instance be stopped, optionally hibernating it.
    fn stop<'a>(
        &'a self,
        instance_id: &'a str,
        hibernate: bool,
    ) -> BoxFuture<'a, anyhow::Result<()>>;
}
