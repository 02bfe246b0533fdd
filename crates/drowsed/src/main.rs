//! drowsed: the drowse daemon.
//!
//! Polls the Drone queue and the supervised EC2 instance, starts the
//! instance when builds are waiting, and stops it (optionally hibernating)
//! once the queue has been empty for the stop timeout.
//!
//! # Usage
//!
//! ```text
//! DRONE_SERVER=https://drone.example.com \
//! DRONE_TOKEN=... \
//! EC2_INSTANCE_ID=i-0123456789abcdef0 \
//! drowsed
//! ```
//!
//! A failed check cycle ends the process with exit code 1 unless
//! `TERMINATE_ON_PLANNING_ERROR=false`; a process manager is expected to
//! restart it.

mod config;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use drowse_core::{ComputeApi, QueueSource};
use drowse_plan::RemotePlanner;
use drowse_remote::{DroneQueueClient, Ec2Client};
use drowse_scheduler::ActionScheduler;
use drowse_supervisor::{ActionDispatcher, Supervisor};

use crate::config::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level, cli.pretty_logs) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    let code: u8 = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %format!("{e:#}"), "{e}");
            1
        }
    };

    info!(phase = "finish", result = code, "exiting program with exit code {code}");
    ExitCode::from(code)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.to_config()?;

    // ── Collaborators ──────────────────────────────────────────

    let drone: Arc<dyn QueueSource> = Arc::new(DroneQueueClient::new(&config.drone)?);
    let ec2: Arc<dyn ComputeApi> = Arc::new(Ec2Client::from_env().await);
    let scheduler = Arc::new(ActionScheduler::new());

    info!(phase = "start", ?config, "initialization complete");

    // ── Supervisor ─────────────────────────────────────────────

    let planner = Arc::new(RemotePlanner::new(drone, ec2.clone(), &config));
    let dispatcher = Arc::new(ActionDispatcher::new(scheduler.clone(), ec2, &config));
    let mut handle = Supervisor::new(planner, dispatcher, &config).start();

    let finished = tokio::select! {
        result = handle.wait() => Some(result),
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            None
        }
    };

    match finished {
        Some(result) => result?,
        None => {
            info!("shutdown signal received");
            handle.dispose();
            handle.join().await?;
            if scheduler.is_armed() {
                info!("exiting with a scheduled action still pending");
            }
        }
    }

    Ok(())
}
