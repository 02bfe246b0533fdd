//! drowse-scheduler: executes start/stop actions after a delay.
//!
//! # Architecture
//!
//! ```text
//! ActionScheduler
//!   └── single slot (at most one armed timer)
//!       ├── background task: sleep(delay) → action()
//!       ├── RetryPolicy (0 → 1s, then ×2 capped at 15s)
//!       └── watch::Sender: dropping it cancels the pending sleep
//! ```
//!
//! Arming always replaces whatever occupies the slot. Only the pending
//! sleep is cancellable: once an action has started it runs to completion,
//! but a superseded action never re-arms itself.

pub mod actions;
pub mod retry;
pub mod scheduler;

pub use actions::{start_action, stop_action};
pub use retry::{RetryPolicy, MAX_RETRY_DELAY};
pub use scheduler::{action_fn, ActionFn, ActionScheduler, SlotStatus};
