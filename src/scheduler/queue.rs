use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::error::{Result, SitemapError};
use crate::scheduler::job::{JobStatus, SitemapJobRequest, SitemapJobResult};

const DEFAULT_MAX_JOBS: usize = 10_000;

/// Scheduling priority. Scheduler-triggered generation runs at `Low` so it
/// never starves manually requested work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Normal,
    Low,
}

/// Options attached to one enqueue.
#[derive(Debug, Clone, Copy)]
pub struct EnqueueOptions {
    /// Startup delay before the job becomes visible to workers.
    pub delay: Duration,
    pub priority: Priority,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            priority: Priority::Normal,
        }
    }
}

/// Tracked state of one enqueued job.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub request: SitemapJobRequest,
    pub status: JobStatus,
    pub priority: Priority,
    /// Completion percentage, monotonically increasing.
    pub progress: u8,
    pub result: Option<SitemapJobResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct PendingEntry {
    job_id: Uuid,
    priority: Priority,
    not_before: DateTime<Utc>,
    seq: u64,
}

/// In-process job queue with delayed visibility and priority ordering.
///
/// Among jobs whose delay has elapsed, the highest-priority one is handed
/// out first; ties go to the earliest enqueue. The platform's real message
/// queue sits behind the same enqueue contract.
#[derive(Debug)]
pub struct JobQueue {
    jobs: HashMap<Uuid, JobRecord>,
    pending: Vec<PendingEntry>,
    seq: u64,
    max_jobs: usize,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_JOBS)
    }

    pub fn with_capacity(max_jobs: usize) -> Self {
        Self {
            jobs: HashMap::new(),
            pending: Vec::new(),
            seq: 0,
            max_jobs,
        }
    }

    /// Enqueue a job. Fails with [`SitemapError::QueueFull`] at capacity.
    pub fn enqueue(&mut self, request: SitemapJobRequest, opts: EnqueueOptions) -> Result<Uuid> {
        if self.jobs.len() >= self.max_jobs {
            return Err(SitemapError::QueueFull);
        }
        let job_id = request.job_id;
        let now = Utc::now();
        let not_before = now
            + chrono::Duration::from_std(opts.delay)
                .map_err(|e| SitemapError::Internal(e.to_string()))?;
        self.jobs.insert(
            job_id,
            JobRecord {
                request,
                status: JobStatus::Pending,
                priority: opts.priority,
                progress: 0,
                result: None,
                error: None,
                created_at: now,
                started_at: None,
                completed_at: None,
            },
        );
        self.pending.push(PendingEntry {
            job_id,
            priority: opts.priority,
            not_before,
            seq: self.seq,
        });
        self.seq += 1;
        Ok(job_id)
    }

    /// Hand out the best visible job, marking it running. Returns `None`
    /// when nothing is ready yet.
    pub fn pop_ready(&mut self, now: DateTime<Utc>) -> Option<SitemapJobRequest> {
        let best = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.not_before <= now)
            .min_by_key(|(_, e)| (e.priority, e.seq))
            .map(|(i, _)| i)?;
        let entry = self.pending.swap_remove(best);
        let record = self.jobs.get_mut(&entry.job_id)?;
        record.status = JobStatus::Running;
        record.started_at = Some(now);
        Some(record.request.clone())
    }

    /// Earliest instant at which a pending job becomes visible.
    pub fn next_visible_at(&self) -> Option<DateTime<Utc>> {
        self.pending.iter().map(|e| e.not_before).min()
    }

    /// Record progress for a running job. Progress never moves backwards.
    pub fn update_progress(&mut self, job_id: &Uuid, progress: u8) {
        if let Some(record) = self.jobs.get_mut(job_id) {
            record.progress = record.progress.max(progress.min(100));
        }
    }

    /// Record the coordinator's result. Partial failures map to `Failed`.
    pub fn complete(&mut self, job_id: &Uuid, result: SitemapJobResult) {
        if let Some(record) = self.jobs.get_mut(job_id) {
            record.status = if result.success {
                JobStatus::Completed
            } else {
                JobStatus::Failed
            };
            record.progress = 100;
            record.completed_at = Some(Utc::now());
            record.result = Some(result);
        }
    }

    /// Record a fatal failure (e.g. tenant not found).
    pub fn fail(&mut self, job_id: &Uuid, error: String) {
        if let Some(record) = self.jobs.get_mut(job_id) {
            record.status = JobStatus::Failed;
            record.completed_at = Some(Utc::now());
            record.error = Some(error);
        }
    }

    pub fn job(&self, job_id: &Uuid) -> Option<&JobRecord> {
        self.jobs.get(job_id)
    }

    /// Remove completed and failed jobs. Returns the number removed.
    pub fn cleanup_finished_jobs(&mut self) -> usize {
        let before = self.jobs.len();
        self.jobs
            .retain(|_, r| r.status != JobStatus::Completed && r.status != JobStatus::Failed);
        before - self.jobs.len()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.jobs.len() >= self.max_jobs
    }
}

/// Cloneable handle sharing one [`JobQueue`] between the scheduler and the
/// worker loop. Wakes waiting workers on enqueue.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    inner: Arc<Mutex<JobQueue>>,
    notify: Arc<Notify>,
}

impl QueueHandle {
    pub fn new(queue: JobQueue) -> Self {
        Self {
            inner: Arc::new(Mutex::new(queue)),
            notify: Arc::new(Notify::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobQueue> {
        // A poisoned queue mutex only means a panic mid-update; the map
        // itself stays usable, so recover rather than propagate the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn enqueue(&self, request: SitemapJobRequest, opts: EnqueueOptions) -> Result<Uuid> {
        let id = self.lock().enqueue(request, opts)?;
        self.notify.notify_one();
        Ok(id)
    }

    pub fn pop_ready(&self, now: DateTime<Utc>) -> Option<SitemapJobRequest> {
        self.lock().pop_ready(now)
    }

    pub fn next_visible_at(&self) -> Option<DateTime<Utc>> {
        self.lock().next_visible_at()
    }

    pub fn update_progress(&self, job_id: &Uuid, progress: u8) {
        self.lock().update_progress(job_id, progress);
    }

    pub fn complete(&self, job_id: &Uuid, result: SitemapJobResult) {
        self.lock().complete(job_id, result);
    }

    pub fn fail(&self, job_id: &Uuid, error: String) {
        self.lock().fail(job_id, error);
    }

    pub fn job(&self, job_id: &Uuid) -> Option<JobRecord> {
        self.lock().job(job_id).cloned()
    }

    pub fn cleanup_finished_jobs(&self) -> usize {
        self.lock().cleanup_finished_jobs()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait until new work may be available.
    pub async fn wait_for_work(&self) {
        self.notify.notified().await;
    }
}
