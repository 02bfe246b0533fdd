//! drowse-supervisor: the check loop.
//!
//! Every `check_interval` the supervisor asks its [`Planner`] for the next
//! action and hands it to a [`Dispatcher`] only when it differs from the
//! action planned on the previous cycle.
//!
//! ```text
//! tick ──► planner.plan() ──► action == last? ──yes──► (nothing)
//!                                  │
//!                                  no
//!                                  ▼
//!                      dispatcher.dispatch(action)
//!                        NoOp         → scheduler.disarm()
//!                        Start        → scheduler.arm(start, 0s)
//!                        ScheduleStop → scheduler.arm(stop, stop_timeout)
//! ```
//!
//! Each tick runs its cycle as a separate task, so a slow cycle can overlap
//! the next one.
//!
//! Disposing the supervisor stops the ticks but leaves the scheduler
//! alone: a stop or start that is already armed still runs.
//!
//! [`Planner`]: drowse_plan::Planner

pub mod dispatch;
pub mod supervisor;

pub use dispatch::{ActionDispatcher, Dispatcher};
pub use supervisor::{Supervisor, SupervisorError, SupervisorHandle};
