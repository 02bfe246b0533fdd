//! Command-line and environment configuration.

use std::time::Duration;

use clap::{ArgAction, Parser};

use drowse_core::config::{
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_IGNORE_RUNNING_FOR_SECS, DEFAULT_STOP_TIMEOUT_SECS,
};
use drowse_core::{staleness_window, Config, ConfigError, DroneConfig, Ec2Config, PlanningErrorPolicy};

#[derive(Debug, Parser)]
#[command(
    name = "drowsed",
    version,
    about = "Keeps an EC2 build agent running only while the Drone queue has work"
)]
pub struct Cli {
    /// Drone API token.
    #[arg(long, env = "DRONE_TOKEN", hide_env_values = true)]
    pub drone_token: String,

    /// Drone server base URL.
    #[arg(long, env = "DRONE_SERVER")]
    pub drone_server: String,

    /// ID of the EC2 instance to supervise.
    #[arg(long, env = "EC2_INSTANCE_ID")]
    pub ec2_instance_id: String,

    /// Hibernate the instance instead of a plain stop.
    #[arg(long, env = "EC2_HIBERNATION_ENABLED", default_value_t = false, action = ArgAction::Set)]
    pub ec2_hibernation_enabled: bool,

    /// Seconds between check cycles.
    #[arg(long, env = "CHECK_INTERVAL_SECONDS", default_value_t = DEFAULT_CHECK_INTERVAL_SECS)]
    pub check_interval_seconds: u64,

    /// Seconds to wait after the queue drains before stopping.
    #[arg(long, env = "STOP_TIMEOUT_SECONDS", default_value_t = DEFAULT_STOP_TIMEOUT_SECS)]
    pub stop_timeout_seconds: u64,

    /// Ignore running builds older than this many seconds (0 disables).
    #[arg(long, env = "IGNORE_RUNNING_FOR_SECONDS", default_value_t = DEFAULT_IGNORE_RUNNING_FOR_SECS)]
    pub ignore_running_for_seconds: u64,

    /// Exit when a check cycle fails instead of retrying on the next tick.
    #[arg(long, env = "TERMINATE_ON_PLANNING_ERROR", default_value_t = true, action = ArgAction::Set)]
    pub terminate_on_planning_error: bool,

    /// Tracing filter directive, e.g. `info` or `drowse_plan=trace`.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Human-readable logs instead of JSON.
    #[arg(long, env = "PRETTY_LOGS", default_value_t = false, action = ArgAction::Set)]
    pub pretty_logs: bool,
}

impl Cli {
    /// Build and validate the runtime config.
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let config = Config {
            check_interval: Duration::from_secs(self.check_interval_seconds),
            stop_timeout: Duration::from_secs(self.stop_timeout_seconds),
            planning_error_policy: PlanningErrorPolicy::from_terminate_flag(
                self.terminate_on_planning_error,
            ),
            drone: DroneConfig {
                server: self.drone_server.clone(),
                token: self.drone_token.clone(),
                ignore_running_for: staleness_window(self.ignore_running_for_seconds),
            },
            ec2: Ec2Config {
                instance_id: self.ec2_instance_id.clone(),
                hibernation_enabled: self.ec2_hibernation_enabled,
            },
        };
        config.validate()?;
        Ok(config)
    }
}
