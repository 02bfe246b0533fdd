//! drowse-plan: turns remote state into the next action.
//!
//! # Planning Algorithm
//!
//! ```text
//! queue    = GET {server}/api/queue        ┐ concurrently
//! instance = describe(instance_id)         ┘
//!
//! queue_state    = classify_queue(queue, ignore_running_for, now)
//! instance_state = classify_instance(instance)
//!
//! Empty            + Pending|Running  → ScheduleStop
//! Pending|Running  + Stopping|Stopped → Start
//! anything else                       → NoOp
//! ```
//!
//! Running builds older than the staleness window are ignored so a build
//! wedged in `running` cannot pin the instance on forever.

pub mod classify;
pub mod cycle;
pub mod planner;

pub use classify::{classify_instance, classify_queue};
pub use cycle::{Planner, RemotePlanner};
pub use planner::next_action;
