use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use croner::Cron;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::config::SitemapConfig;
use crate::error::Result;
use crate::scheduler::job::SitemapJobRequest;
use crate::scheduler::queue::{EnqueueOptions, Priority, QueueHandle};
use crate::store::TenantStore;

/// Daily scheduling pass: enqueues one generation job per active tenant,
/// spread over a random jitter window so tenants do not all hit the
/// database and the pinged search engines at the same instant.
pub struct SitemapScheduler {
    tenants: Arc<dyn TenantStore>,
    queue: QueueHandle,
    config: Arc<SitemapConfig>,
}

impl SitemapScheduler {
    pub fn new(
        tenants: Arc<dyn TenantStore>,
        queue: QueueHandle,
        config: Arc<SitemapConfig>,
    ) -> Self {
        Self {
            tenants,
            queue,
            config,
        }
    }

    /// Run one scheduling pass. Tenant enumeration failure aborts the pass;
    /// a single tenant's enqueue failure is logged and does not block the
    /// others. Returns the number of jobs enqueued.
    pub async fn schedule_generation(&self) -> Result<usize> {
        let tenants = self.tenants.active_tenants().await?;
        tracing::info!(tenant_count = tenants.len(), "Starting sitemap scheduling pass");

        let max_jitter_secs = self.config.max_jitter.as_secs();
        let mut enqueued = 0usize;

        for tenant in &tenants {
            let request = SitemapJobRequest::scheduled(tenant);
            let jitter = Duration::from_secs(rand::thread_rng().gen_range(0..=max_jitter_secs));
            let opts = EnqueueOptions {
                delay: jitter,
                priority: Priority::Low,
            };
            match self.queue.enqueue(request, opts) {
                Ok(job_id) => {
                    tracing::debug!(
                        tenant_id = %tenant.id,
                        job_id = %job_id,
                        jitter_secs = jitter.as_secs(),
                        "Sitemap job enqueued"
                    );
                    enqueued += 1;
                }
                Err(e) => {
                    tracing::error!(tenant_id = %tenant.id, error = %e, "Failed to enqueue sitemap job");
                }
            }
        }

        tracing::info!(enqueued, "Sitemap scheduling pass complete");
        Ok(enqueued)
    }

    /// Run the cron loop until cancelled. Each tick performs one scheduling
    /// pass; a failed pass is logged and retried at the next occurrence.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let cron = Cron::new(&self.config.cron).parse()?;

        loop {
            let now = Utc::now();
            let next = cron.find_next_occurrence(&now, false)?;
            let sleep_for = (next - now).to_std().unwrap_or(Duration::ZERO);
            tracing::debug!(next = %next, "Next sitemap scheduling pass");

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Scheduler shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(sleep_for) => {
                    if let Err(e) = self.schedule_generation().await {
                        tracing::error!(error = %e, "Sitemap scheduling pass failed");
                    }
                }
            }
        }
    }
}
