use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use super::cycle::Orchestrator;
use super::summary::CycleSummary;

/// Fixed-interval driver for [`Orchestrator::run_cycle`].
///
/// Cycles are awaited inline, so a tick that comes due while a cycle is
/// still running is delayed until it finishes. Ticks never stack up into
/// back-to-back bursts.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Run cycles until `shutdown` resolves, returning how many completed.
    ///
    /// With `run_now` the first cycle starts immediately; otherwise after one
    /// interval. Shutdown is only observed between cycles, so an in-flight
    /// cycle always finishes.
    pub async fn run_until<S>(&self, run_now: bool, shutdown: S) -> usize
    where
        S: Future<Output = ()>,
    {
        let first = if run_now {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = time::interval_at(first, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        let mut completed = 0usize;
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "scheduler started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(cycles = completed, "scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let summary = self.orchestrator.run_cycle().await;
                    completed += 1;
                    log_cycle(&summary);
                }
            }
        }
        completed
    }
}

fn log_cycle(summary: &CycleSummary) {
    if summary.skipped_no_trigger {
        tracing::info!("cycle skipped: no trigger message");
        return;
    }
    if !summary.report_sent {
        tracing::warn!("cycle finished without delivering the summary report");
    }
}
