//! Shutdown coordination.

use super::SummaryService;
use crate::store::TaskUpdate;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Poll interval while waiting for in-flight work to finish
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for each background loop to exit after cancellation
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

impl SummaryService {
    /// Gracefully shut down the service
    ///
    /// 1. Stops accepting new submissions (they get `503 shutting_down`)
    /// 2. Waits up to `tasks.drain_timeout` for queued and running work
    /// 3. Cancels the workers and the sweeper and waits for them to exit
    /// 4. Marks any job still queued as `failed`
    ///
    /// Calling it more than once is harmless.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new work
        self.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new tasks");

        // 2. Let queued and running jobs finish
        let drain_timeout = self.config.tasks.drain_timeout();
        match tokio::time::timeout(drain_timeout, self.wait_for_idle()).await {
            Ok(()) => tracing::info!("All in-flight tasks completed"),
            Err(_) => tracing::warn!(
                in_flight = self.in_flight.load(Ordering::SeqCst),
                timeout_secs = drain_timeout.as_secs(),
                "Timeout waiting for tasks to complete, proceeding with shutdown"
            ),
        }

        // 3. Stop background loops
        self.cancel_token.cancel();
        let handles = std::mem::take(&mut *self.background.lock().await);
        for handle in handles {
            if tokio::time::timeout(JOIN_TIMEOUT, handle).await.is_err() {
                tracing::warn!("Background task did not stop in time");
            }
        }

        // 4. Anything still queued will never run
        let abandoned = self.fail_queued_jobs().await;
        if abandoned > 0 {
            tracing::warn!(abandoned, "Marked queued tasks as failed");
        }

        tracing::info!("Graceful shutdown complete");
    }

    /// Wait until no job is queued or running and no inline request is active
    async fn wait_for_idle(&self) {
        loop {
            let in_flight = self.in_flight.load(Ordering::SeqCst);
            if in_flight == 0 {
                return;
            }
            tracing::debug!(in_flight, "Waiting for in-flight tasks");
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }

    /// Drain the queue, failing each job's record; returns how many were failed
    async fn fail_queued_jobs(&self) -> usize {
        let mut rx = self.job_rx.lock().await;
        let mut failed = 0;
        while let Ok(job) = rx.try_recv() {
            let update = TaskUpdate::Fail("service shut down before the task started".into());
            match self.store.update(job.task_id, update).await {
                Ok(_) => failed += 1,
                Err(e) => {
                    tracing::debug!(task_id = %job.task_id, error = %e, "could not fail queued task")
                }
            }
        }
        failed
    }
}
