//! Worker side of the sitemap pipeline.
//!
//! The worker loop consumes jobs from the shared queue and hands each one
//! to the [`SitemapCoordinator`], which owns the full per-tenant run:
//!
//! 1. Acquire the tenant lock (non-blocking; skip when held)
//! 2. Regeneration guard (skip when recently generated, unless forced)
//! 3. Build each requested (locale, type) sitemap, isolating failures
//! 4. Derive the index from the survivors
//! 5. Publish: cache, upload, ping
//! 6. Release the lock on every exit path
//!
//! The worker drains its current job and exits when the shutdown token is
//! cancelled; delayed jobs simply stay queued.

pub mod coordinator;

pub use coordinator::SitemapCoordinator;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::scheduler::job::SitemapJobRequest;
use crate::scheduler::queue::QueueHandle;

/// Upper bound on idle sleeps so a worker never misses work for long even
/// without a wakeup.
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct Worker {
    queue: QueueHandle,
    coordinator: Arc<SitemapCoordinator>,
}

impl Worker {
    pub fn new(queue: QueueHandle, coordinator: Arc<SitemapCoordinator>) -> Self {
        Self { queue, coordinator }
    }

    /// Consume jobs until cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            match self.queue.pop_ready(Utc::now()) {
                Some(request) => self.process(request).await,
                None => {
                    let sleep_for = match self.queue.next_visible_at() {
                        Some(at) => (at - Utc::now())
                            .to_std()
                            .unwrap_or(Duration::ZERO)
                            .min(IDLE_POLL_INTERVAL),
                        None => IDLE_POLL_INTERVAL,
                    };
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = self.queue.wait_for_work() => {}
                        _ = tokio::time::sleep(sleep_for) => {}
                    }
                }
            }
        }
        tracing::info!("Sitemap worker shutting down");
    }

    async fn process(&self, request: SitemapJobRequest) {
        let job_id = request.job_id;
        tracing::info!(
            job_id = %job_id,
            tenant_id = %request.tenant_id,
            triggered_by = %request.triggered_by,
            types = ?request.types,
            locales = ?request.locales,
            "Processing sitemap job"
        );

        let queue = self.queue.clone();
        let progress = move |pct: u8| queue.update_progress(&job_id, pct);

        match self.coordinator.execute(&request, &progress).await {
            Ok(result) => {
                tracing::info!(
                    job_id = %job_id,
                    tenant_id = %request.tenant_id,
                    success = result.success,
                    skipped = result.skipped,
                    sitemaps = result.sitemaps.len(),
                    total_urls = result.total_urls,
                    duration_ms = result.duration_ms,
                    "Sitemap job finished"
                );
                self.queue.complete(&job_id, result);
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job_id,
                    tenant_id = %request.tenant_id,
                    error = %e,
                    "Sitemap job failed"
                );
                self.queue.fail(&job_id, e.to_string());
            }
        }
    }
}
