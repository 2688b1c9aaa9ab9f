//! Top-level wiring of the sitemap subsystem.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::SitemapConfig;
use crate::error::Result;
use crate::lock::LockService;
use crate::publish::{Publisher, SearchEnginePinger};
use crate::scheduler::job::{SitemapJobRequest, SitemapJobResult};
use crate::scheduler::queue::{EnqueueOptions, JobQueue, JobRecord, QueueHandle};
use crate::scheduler::trigger::SitemapScheduler;
use crate::store::{Cache, CatalogStore, ObjectStorage, TenantStore};
use crate::worker::{SitemapCoordinator, Worker};

/// Assembles the scheduler, queue, worker and coordinator around the
/// platform's stores, cache, storage, lock service and pinger.
pub struct SitemapService {
    queue: QueueHandle,
    scheduler: SitemapScheduler,
    worker: Worker,
    coordinator: Arc<SitemapCoordinator>,
}

impl SitemapService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SitemapConfig,
        tenants: Arc<dyn TenantStore>,
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<dyn Cache>,
        storage: Arc<dyn ObjectStorage>,
        lock: Arc<dyn LockService>,
        pinger: Arc<dyn SearchEnginePinger>,
    ) -> Self {
        let config = Arc::new(config);
        let queue = QueueHandle::new(JobQueue::with_capacity(config.max_queued_jobs));
        let publisher = Publisher::new(
            Arc::clone(&cache),
            storage,
            pinger,
            Arc::clone(&config),
        );
        let coordinator = Arc::new(SitemapCoordinator::new(
            Arc::clone(&tenants),
            catalog,
            cache,
            lock,
            publisher,
            Arc::clone(&config),
        ));
        let scheduler = SitemapScheduler::new(tenants, queue.clone(), Arc::clone(&config));
        let worker = Worker::new(queue.clone(), Arc::clone(&coordinator));
        Self {
            queue,
            scheduler,
            worker,
            coordinator,
        }
    }

    pub fn queue(&self) -> &QueueHandle {
        &self.queue
    }

    /// Enqueue a manually triggered job at normal priority, no delay.
    pub fn enqueue_manual(&self, request: SitemapJobRequest) -> Result<Uuid> {
        self.queue.enqueue(request, EnqueueOptions::default())
    }

    pub fn job(&self, job_id: &Uuid) -> Option<JobRecord> {
        self.queue.job(job_id)
    }

    /// Run one generation synchronously, bypassing the queue. Used by the
    /// one-shot CLI path; the daemon path goes through [`Self::run`].
    pub async fn generate_now(&self, request: &SitemapJobRequest) -> Result<SitemapJobResult> {
        self.coordinator.execute(request, &|_| {}).await
    }

    /// Run one scheduling pass immediately (outside the cron cadence).
    pub async fn run_scheduling_pass(&self) -> Result<usize> {
        self.scheduler.schedule_generation().await
    }

    /// Run the daily scheduler and the worker loop until cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        let scheduler = self.scheduler.run(shutdown.clone());
        let worker = self.worker.run(shutdown.clone());
        let (scheduler_result, _) = tokio::join!(scheduler, worker);
        if let Err(e) = scheduler_result {
            tracing::error!(error = %e, "Scheduler exited with error");
        }
    }
}
