//! Job scheduling for sitemap generation.
//!
//! - [`job`]: queue payload and result types
//! - [`queue`]: in-process job queue with delayed visibility and priorities
//! - [`trigger`]: the daily cron pass that enqueues one job per tenant

pub mod job;
pub mod queue;
pub mod trigger;

pub use job::{JobStatus, SitemapJobRequest, SitemapJobResult, TriggerSource};
pub use queue::{EnqueueOptions, JobQueue, Priority, QueueHandle};
pub use trigger::SitemapScheduler;
