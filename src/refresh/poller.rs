//! Background poll loop running bulk refresh sweeps on a fixed cadence.

use super::Refresher;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawn the background poller.
///
/// Runs a full refresh sweep every `interval_secs`. Callers should not spawn
/// this when the interval is zero (polling disabled).
pub fn spawn_poller(refresher: Arc<Refresher>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(interval_secs, "Background refresh poller started");
        loop {
            ticker.tick().await;
            match refresher.refresh_all().await {
                Ok(summary) => info!(
                    refreshed = summary.refreshed,
                    skipped = summary.skipped,
                    errors = summary.errors,
                    "Scheduled refresh sweep complete"
                ),
                Err(e) => warn!(error = %e, "Scheduled refresh sweep failed"),
            }
        }
    })
}
