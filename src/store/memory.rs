//! In-memory store implementations for tests and the demo binary.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::{Cache, CatalogStore, Category, ObjectStorage, Product, Tenant, TenantStore};

#[derive(Debug, Default)]
pub struct MemoryTenantStore {
    tenants: RwLock<Vec<Tenant>>,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, tenant: Tenant) {
        self.tenants.write().await.push(tenant);
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn active_tenants(&self) -> Result<Vec<Tenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .iter()
            .filter(|t| t.active && !t.deleted)
            .cloned()
            .collect())
    }

    async fn tenant(&self, id: &str) -> Result<Option<Tenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .iter()
            .find(|t| t.id == id && !t.deleted)
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    products: RwLock<HashMap<String, Vec<Product>>>,
    categories: RwLock<HashMap<String, Vec<Category>>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_products(&self, tenant_id: &str, products: Vec<Product>) {
        self.products
            .write()
            .await
            .entry(tenant_id.to_string())
            .or_default()
            .extend(products);
    }

    pub async fn insert_categories(&self, tenant_id: &str, categories: Vec<Category>) {
        self.categories
            .write()
            .await
            .entry(tenant_id.to_string())
            .or_default()
            .extend(categories);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn active_products(&self, tenant_id: &str, limit: usize) -> Result<Vec<Product>> {
        Ok(self
            .products
            .read()
            .await
            .get(tenant_id)
            .map(|products| {
                products
                    .iter()
                    .filter(|p| p.active)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn active_categories(&self, tenant_id: &str) -> Result<Vec<Category>> {
        Ok(self
            .categories
            .read()
            .await
            .get(tenant_id)
            .map(|categories| categories.iter().filter(|c| c.active).cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// TTL-aware in-memory cache. Expired entries read as absent.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Utc::now())
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| crate::error::SitemapError::Cache(e.to_string()))?;
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }
}

/// In-memory object storage keyed by object path.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    base_url: String,
    objects: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn object(&self, key: &str) -> Option<String> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, content: &str, _content_type: &str) -> Result<String> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), content.to_string());
        Ok(format!("{}/{}", self.base_url, key))
    }
}
