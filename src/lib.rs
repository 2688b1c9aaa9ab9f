//! Multi-tenant sitemap generation worker.
//!
//! A scheduled, lock-guarded background job that builds XML sitemaps from
//! catalog state, caches them, uploads them to object storage and pings
//! search engines. One job covers one tenant; tenants run independently
//! under their own locks.

pub mod config;
pub mod error;
pub mod lock;
pub mod publish;
pub mod scheduler;
pub mod service;
pub mod shutdown;
pub mod sitemap;
pub mod store;
pub mod worker;

pub use error::{Result, SitemapError};
