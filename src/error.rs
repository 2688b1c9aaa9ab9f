use thiserror::Error;

#[derive(Error, Debug)]
pub enum SitemapError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Job not found: {0}")]
    JobNotFound(uuid::Uuid),

    #[error("Job queue is full")]
    QueueFull,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Invalid cron expression: {0}")]
    Cron(#[from] croner::errors::CronError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SitemapError>;
