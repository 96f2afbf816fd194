//! Timed cycle loop.
//!
//! Cycles run on the blocking pool so the runtime stays free to observe Ctrl-C. A failed
//! cycle is logged and the loop keeps its cadence.

use anyhow::Result;
use rulewatch_common::Config;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::commands::{format_summary, run_cycle};

/// Run cycles every `interval` until interrupted.
pub async fn run(config: Config, interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_secs = interval.as_secs(), "Daemon started");
    println!("rulewatch daemon started (every {}s). Press Ctrl+C to stop", interval.as_secs());

    let mut cycles: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cycles += 1;
                let cycle_config = config.clone();
                match tokio::task::spawn_blocking(move || run_cycle(&cycle_config)).await {
                    Ok(Ok(report)) => println!("{}", format_summary(&report)),
                    Ok(Err(e)) => {
                        tracing::error!(cycle = cycles, error = %format!("{e:#}"), "Cycle failed");
                    }
                    Err(e) => {
                        tracing::error!(cycle = cycles, error = %e, "Cycle task aborted");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(cycles, "Shutdown requested");
                println!("\nShutting down...");
                break;
            }
        }
    }

    Ok(())
}
