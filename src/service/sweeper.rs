//! Periodic removal of expired task records

use crate::store::TaskStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawn the sweep loop
///
/// The first sweep runs one `interval` after start. The retention window is
/// the store's own, so the sweep and lazy read-side expiry always agree.
pub(super) fn spawn_sweeper(
    store: Arc<TaskStore>,
    interval: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep(Utc::now(), store.retention()).await;
                    let remaining = store.len().await;
                    tracing::debug!(removed, remaining, "sweep pass finished");
                }
                _ = cancel_token.cancelled() => {
                    tracing::debug!("sweeper stopped");
                    break;
                }
            }
        }
    })
}
