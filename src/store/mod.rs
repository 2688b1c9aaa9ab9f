//! Data access seams for the sitemap subsystem.
//!
//! The platform owns tenants, products and categories; this worker only
//! reads them. The cache and object storage backends are likewise external.
//! Each collaborator is a trait so tests and the demo binary can run against
//! the in-memory implementations in [`memory`].

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An isolated storefront within the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    /// Bare domain, e.g. `shop.example`. Used to build absolute URLs.
    pub domain: String,
    pub locales: Vec<String>,
    pub active: bool,
    pub deleted: bool,
}

impl Tenant {
    /// Absolute HTTPS base URL for this tenant, without trailing slash.
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain)
    }

    /// Locales to generate for, falling back to `en` when unconfigured.
    pub fn effective_locales(&self) -> Vec<String> {
        if self.locales.is_empty() {
            vec!["en".to_string()]
        } else {
            self.locales.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// Hierarchy depth; 0 is top-level.
    pub depth: u32,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

/// Read-only tenant lookup.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// All tenants that are active and not soft-deleted.
    async fn active_tenants(&self) -> Result<Vec<Tenant>>;

    async fn tenant(&self, id: &str) -> Result<Option<Tenant>>;
}

/// Read-only product/category lookup for one tenant.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Active products for the tenant, up to `limit`.
    async fn active_products(&self, tenant_id: &str, limit: usize) -> Result<Vec<Product>>;

    async fn active_categories(&self, tenant_id: &str) -> Result<Vec<Category>>;
}

/// Shared key-value cache with per-entry TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
}

/// Durable object storage. `put` returns the object's public URL.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, content: &str, content_type: &str) -> Result<String>;
}

/// Cache key for one generated sitemap document.
pub fn sitemap_cache_key(tenant_id: &str, locale: &str, sitemap_type: &str) -> String {
    format!("sitemap:{}:{}:{}", tenant_id, locale, sitemap_type)
}

/// Cache key for a tenant's sitemap index document.
pub fn index_cache_key(tenant_id: &str) -> String {
    format!("sitemap:{}:index", tenant_id)
}

/// Cache key for a tenant's last successful generation timestamp.
pub fn last_generated_key(tenant_id: &str) -> String {
    format!("sitemap:{}:last-generated", tenant_id)
}
