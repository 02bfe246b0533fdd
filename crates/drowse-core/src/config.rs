//! Runtime configuration for the control core.
//!
//! Built once at process start (see `drowsed`) and treated as immutable
//! for the lifetime of the process.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_IGNORE_RUNNING_FOR_SECS: u64 = 3600;

/// Upper bound for the check interval and the stop timeout.
pub const MAX_TIMER_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interval between check cycles.
    pub check_interval: Duration,
    /// Grace delay before a scheduled stop fires.
    pub stop_timeout: Duration,
    /// What the supervisor does when a check cycle fails.
    pub planning_error_policy: PlanningErrorPolicy,
    pub drone: DroneConfig,
    pub ec2: Ec2Config,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DroneConfig {
    /// Base URL of the Drone server, e.g. `https://drone.example.com`.
    pub server: String,
    pub token: String,
    /// Running builds older than this are ignored. `None` trusts every
    /// running build regardless of age.
    pub ignore_running_for: Option<Duration>,
}

impl fmt::Debug for DroneConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DroneConfig")
            .field("server", &self.server)
            .field("token", &"<redacted>")
            .field("ignore_running_for", &self.ignore_running_for)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2Config {
    pub instance_id: String,
    pub hibernation_enabled: bool,
}

/// How a failed check cycle is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanningErrorPolicy {
    /// Stop the supervisor and let the process exit non-zero so an
    /// external process manager restarts it.
    #[default]
    Terminate,
    /// Log the failure and try again on the next tick.
    LogAndContinue,
}

impl PlanningErrorPolicy {
    pub fn from_terminate_flag(terminate_on_planning_error: bool) -> Self {
        if terminate_on_planning_error {
            PlanningErrorPolicy::Terminate
        } else {
            PlanningErrorPolicy::LogAndContinue
        }
    }
}

impl Config {
    /// Build a config with default timings for the given endpoints.
    pub fn new(drone_server: &str, drone_token: &str, instance_id: &str) -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
            planning_error_policy: PlanningErrorPolicy::default(),
            drone: DroneConfig {
                server: drone_server.to_string(),
                token: drone_token.to_string(),
                ignore_running_for: Some(Duration::from_secs(DEFAULT_IGNORE_RUNNING_FOR_SECS)),
            },
            ec2: Ec2Config {
                instance_id: instance_id.to_string(),
                hibernation_enabled: false,
            },
        }
    }

    /// Check the invariants the core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval.is_zero() {
            return Err(ConfigError::Invalid {
                name: "check_interval",
                reason: "must be greater than zero".to_string(),
            });
        }
        for (name, value) in [
            ("check_interval", self.check_interval),
            ("stop_timeout", self.stop_timeout),
        ] {
            if value > Duration::from_secs(MAX_TIMER_SECS) {
                return Err(ConfigError::Invalid {
                    name,
                    reason: format!("must be at most {MAX_TIMER_SECS} seconds"),
                });
            }
        }
        if self.drone.token.trim().is_empty() {
            return Err(ConfigError::Missing("DRONE_TOKEN"));
        }
        if self.drone.server.trim().is_empty() {
            return Err(ConfigError::Missing("DRONE_SERVER"));
        }
        if !(self.drone.server.starts_with("http://") || self.drone.server.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "DRONE_SERVER",
                reason: format!("'{}' is not an http(s) URL", self.drone.server),
            });
        }
        if self.ec2.instance_id.trim().is_empty() {
            return Err(ConfigError::Missing("EC2_INSTANCE_ID"));
        }
        Ok(())
    }
}

/// Convert a seconds setting into a staleness window; `0` disables it.
pub fn staleness_window(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
