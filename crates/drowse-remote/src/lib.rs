//! drowse-remote: clients for the systems the control core talks to.
//!
//! - [`DroneQueueClient`]: `GET {server}/api/queue` with a bearer token.
//! - [`Ec2Client`]: describe/start/stop one EC2 instance.
//!
//! Both implement the traits from `drowse_core::remote` so the planner and
//! scheduler never see a concrete client.

pub mod drone;
pub mod ec2;

pub use drone::DroneQueueClient;
pub use ec2::Ec2Client;
