// src/ingest/scheduler.rs
use metrics::counter;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ingest::{refresh, RefreshContext};

/// Spawn the periodic refresh loop.
///
/// The first tick fires one `interval` from now; the eager startup refresh
/// covers time zero. Sending `true` on (or dropping) the shutdown channel
/// stops the loop. A refresh interrupted by shutdown is dropped before it
/// publishes, so the previous catalog stays current.
pub fn spawn_refresh_scheduler(
    ctx: RefreshContext,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                catalog = refresh(&ctx) => {
                    counter!("refresh_scheduled_runs_total").increment(1);
                    tracing::info!(
                        target: "ingest",
                        version = catalog.version(),
                        programs = catalog.len(),
                        "scheduled refresh tick"
                    );
                }
                _ = shutdown.changed() => {
                    tracing::warn!(
                        target: "ingest",
                        "shutdown during refresh; keeping previous catalog"
                    );
                    break;
                }
            }
        }
        tracing::info!(target: "ingest", "refresh scheduler stopped");
    })
}
