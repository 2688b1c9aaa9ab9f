//! Job queue semantics: visibility delays, priorities, lifecycle.


use std::time::Duration;

use chrono::Utc;

use sitemapd::error::SitemapError;
use sitemapd::scheduler::job::JobStatus;
use sitemapd::scheduler::queue::{EnqueueOptions, JobQueue, Priority};
use sitemapd::scheduler::SitemapJobResult;
use sitemapd::sitemap::SitemapType;

use test_harness::request;

fn opts(delay: Duration, priority: Priority) -> EnqueueOptions {
    EnqueueOptions { delay, priority }
}

#[test]
fn delayed_jobs_are_invisible_until_due() {
    let mut queue = JobQueue::new();
    let req = request(vec![SitemapType::Pages], vec!["en"]);
    queue
        .enqueue(req, opts(Duration::from_secs(300), Priority::Low))
        .unwrap();

    let now = Utc::now();
    assert!(queue.pop_ready(now).is_none());

    // Visible once the delay has elapsed.
    let later = now + chrono::Duration::seconds(301);
    assert!(queue.pop_ready(later).is_some());
}

#[test]
fn normal_priority_pops_before_low() {
    let mut queue = JobQueue::new();
    let low = request(vec![SitemapType::Pages], vec!["en"]);
    let normal = request(vec![SitemapType::Pages], vec!["en"]);
    let normal_id = normal.job_id;

    queue.enqueue(low, opts(Duration::ZERO, Priority::Low)).unwrap();
    queue
        .enqueue(normal, opts(Duration::ZERO, Priority::Normal))
        .unwrap();

    let popped = queue.pop_ready(Utc::now()).unwrap();
    assert_eq!(popped.job_id, normal_id);
}

#[test]
fn equal_priority_is_fifo() {
    let mut queue = JobQueue::new();
    let first = request(vec![SitemapType::Pages], vec!["en"]);
    let second = request(vec![SitemapType::Pages], vec!["en"]);
    let first_id = first.job_id;

    queue
        .enqueue(first, opts(Duration::ZERO, Priority::Low))
        .unwrap();
    queue
        .enqueue(second, opts(Duration::ZERO, Priority::Low))
        .unwrap();

    assert_eq!(queue.pop_ready(Utc::now()).unwrap().job_id, first_id);
}

#[test]
fn a_delayed_job_does_not_block_ready_work() {
    let mut queue = JobQueue::new();
    let delayed = request(vec![SitemapType::Pages], vec!["en"]);
    let ready = request(vec![SitemapType::Pages], vec!["en"]);
    let ready_id = ready.job_id;

    // Higher priority but not yet visible.
    queue
        .enqueue(delayed, opts(Duration::from_secs(600), Priority::Normal))
        .unwrap();
    queue
        .enqueue(ready, opts(Duration::ZERO, Priority::Low))
        .unwrap();

    assert_eq!(queue.pop_ready(Utc::now()).unwrap().job_id, ready_id);
}

#[test]
fn capacity_is_enforced() {
    let mut queue = JobQueue::with_capacity(2);
    queue
        .enqueue(
            request(vec![SitemapType::Pages], vec!["en"]),
            EnqueueOptions::default(),
        )
        .unwrap();
    queue
        .enqueue(
            request(vec![SitemapType::Pages], vec!["en"]),
            EnqueueOptions::default(),
        )
        .unwrap();
    assert!(queue.is_full());

    let err = queue
        .enqueue(
            request(vec![SitemapType::Pages], vec!["en"]),
            EnqueueOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, SitemapError::QueueFull));
}

#[test]
fn progress_is_monotonic_and_capped() {
    let mut queue = JobQueue::new();
    let req = request(vec![SitemapType::Pages], vec!["en"]);
    let id = queue.enqueue(req, EnqueueOptions::default()).unwrap();

    queue.update_progress(&id, 40);
    assert_eq!(queue.job(&id).unwrap().progress, 40);

    // Progress never moves backwards, and never exceeds 100.
    queue.update_progress(&id, 20);
    assert_eq!(queue.job(&id).unwrap().progress, 40);
    queue.update_progress(&id, 250);
    assert_eq!(queue.job(&id).unwrap().progress, 100);
}

#[test]
fn lifecycle_states_follow_the_run() {
    let mut queue = JobQueue::new();
    let req = request(vec![SitemapType::Pages], vec!["en"]);
    let id = queue.enqueue(req, EnqueueOptions::default()).unwrap();
    assert_eq!(queue.job(&id).unwrap().status, JobStatus::Pending);

    let popped = queue.pop_ready(Utc::now()).unwrap();
    assert_eq!(popped.job_id, id);
    assert_eq!(queue.job(&id).unwrap().status, JobStatus::Running);

    let result = SitemapJobResult::skipped(&popped, "recently generated, skipping", 1);
    queue.complete(&id, result);
    let record = queue.job(&id).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.progress, 100);
    assert!(record.completed_at.is_some());
}

#[test]
fn fatal_failures_are_recorded() {
    let mut queue = JobQueue::new();
    let req = request(vec![SitemapType::Pages], vec!["en"]);
    let id = queue.enqueue(req, EnqueueOptions::default()).unwrap();
    queue.pop_ready(Utc::now()).unwrap();

    queue.fail(&id, "Tenant not found: t1".to_string());
    let record = queue.job(&id).unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("Tenant not found"));
}

#[test]
fn cleanup_removes_only_finished_jobs() {
    let mut queue = JobQueue::new();
    let done = request(vec![SitemapType::Pages], vec!["en"]);
    let pending = request(vec![SitemapType::Pages], vec!["en"]);
    let done_id = done.job_id;
    let pending_id = pending.job_id;

    queue.enqueue(done, EnqueueOptions::default()).unwrap();
    queue
        .enqueue(pending, opts(Duration::from_secs(600), Priority::Low))
        .unwrap();

    let popped = queue.pop_ready(Utc::now()).unwrap();
    assert_eq!(popped.job_id, done_id);
    queue.complete(&done_id, SitemapJobResult::skipped(&popped, "done", 1));

    assert_eq!(queue.cleanup_finished_jobs(), 1);
    assert!(queue.job(&done_id).is_none());
    assert!(queue.job(&pending_id).is_some());
}
