//! drowse-core: shared types for the drowse control core.
//!
//! Holds the closed state enums produced by classification, the
//! immutable runtime [`Config`], the error types, and the traits the
//! core uses to reach the queue and compute APIs.

pub mod config;
pub mod error;
pub mod remote;
pub mod types;

pub use config::{staleness_window, Config, DroneConfig, Ec2Config, PlanningErrorPolicy};
pub use error::{ConfigError, PlanError, PlanResult};
pub use remote::{BoxFuture, ComputeApi, QueueSource};
pub use types::*;
