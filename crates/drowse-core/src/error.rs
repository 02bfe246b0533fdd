//! Error types for the drowse control core.

use thiserror::Error;

/// Result type alias for planning operations.
pub type PlanResult<T> = Result<T, PlanError>;

/// Failures raised while planning one check cycle.
///
/// None of these are recovered inside the cycle; the supervisor's
/// planning-error policy decides what happens next.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Unable to determine Drone Queue State: unexpected item status '{status}'")]
    Classification { status: String },

    #[error("Unable to determine EC2 Instance State")]
    MissingState,

    #[error("Unable to determine EC2 Instance State: {0}")]
    UnknownInstanceState(#[from] crate::types::UnknownInstanceState),

    #[error(
        "The EC2 Instance '{instance_id}' has been terminated. \
         Please specify the ID of an Instance that is not in the 'terminated' state."
    )]
    Terminated { instance_id: String },

    #[error("failed to fetch queue: {0:#}")]
    QueueFetch(anyhow::Error),

    #[error("failed to describe instance: {0:#}")]
    InstanceFetch(anyhow::Error),
}

/// Errors detected while validating configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
