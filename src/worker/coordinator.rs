use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::config::SitemapConfig;
use crate::error::{Result, SitemapError};
use crate::lock::{tenant_lock_key, LockService};
use crate::publish::Publisher;
use crate::scheduler::job::{SitemapJobRequest, SitemapJobResult, SitemapMeta};
use crate::sitemap::{builders, GeneratedSitemap, SitemapType};
use crate::store::{last_generated_key, Cache, CatalogStore, Tenant, TenantStore};

/// Progress callback invoked with a 0-100 percentage.
pub type ProgressFn<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Per-tenant generation entry point.
///
/// One `execute` call owns the whole run for one tenant: lock, regeneration
/// guard, per-(locale, type) builds with error isolation, index assembly,
/// publication, and the last-generated stamp. The lock is released on every
/// exit path, including fatal errors.
pub struct SitemapCoordinator {
    tenants: Arc<dyn TenantStore>,
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<dyn Cache>,
    lock: Arc<dyn LockService>,
    publisher: Publisher,
    config: Arc<SitemapConfig>,
}

impl SitemapCoordinator {
    pub fn new(
        tenants: Arc<dyn TenantStore>,
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<dyn Cache>,
        lock: Arc<dyn LockService>,
        publisher: Publisher,
        config: Arc<SitemapConfig>,
    ) -> Self {
        Self {
            tenants,
            catalog,
            cache,
            lock,
            publisher,
            config,
        }
    }

    /// Execute one sitemap job. Skip conditions (lock held, recently
    /// generated) return a successful no-op result; a missing tenant is
    /// fatal and propagates to the queue's retry policy.
    pub async fn execute(
        &self,
        request: &SitemapJobRequest,
        progress: ProgressFn<'_>,
    ) -> Result<SitemapJobResult> {
        let started = Instant::now();
        let lock_key = tenant_lock_key(&request.tenant_id);

        // Non-blocking: concurrent triggers must not stack work.
        let token = match self
            .lock
            .acquire(&lock_key, self.config.lock_ttl, Duration::ZERO)
            .await?
        {
            Some(token) => token,
            None => {
                tracing::info!(
                    tenant_id = %request.tenant_id,
                    job_id = %request.job_id,
                    "Sitemap generation already in progress, skipping"
                );
                return Ok(SitemapJobResult::skipped(
                    request,
                    "generation already in progress",
                    elapsed_ms(started),
                ));
            }
        };

        let outcome = self.run_locked(request, progress, started).await;

        // Guaranteed cleanup: release on success, partial failure and fatal
        // error alike. A failed release is logged, never propagated, so it
        // cannot mask the run's own outcome; the TTL is the backstop.
        match self.lock.release(&lock_key, &token).await {
            Ok(released) => {
                if !released {
                    tracing::warn!(lock_key, "Lock was no longer held at release");
                }
            }
            Err(e) => {
                tracing::warn!(lock_key, error = %e, "Failed to release sitemap lock");
            }
        }

        outcome
    }

    async fn run_locked(
        &self,
        request: &SitemapJobRequest,
        progress: ProgressFn<'_>,
        started: Instant,
    ) -> Result<SitemapJobResult> {
        if !request.force_regenerate && self.recently_generated(&request.tenant_id).await? {
            tracing::info!(
                tenant_id = %request.tenant_id,
                job_id = %request.job_id,
                "Sitemaps recently generated, skipping"
            );
            return Ok(SitemapJobResult::skipped(
                request,
                "recently generated, skipping",
                elapsed_ms(started),
            ));
        }

        // Fatal: nothing to build without domain and locale config.
        let tenant = self
            .tenants
            .tenant(&request.tenant_id)
            .await?
            .ok_or_else(|| SitemapError::TenantNotFound(request.tenant_id.clone()))?;

        let combinations = request.combinations(&tenant.effective_locales());
        let total = combinations.len().max(1);
        let mut sitemaps: Vec<GeneratedSitemap> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for (done, (locale, sitemap_type)) in combinations.iter().enumerate() {
            match self.build_one(&tenant, locale, *sitemap_type).await {
                Ok(sitemap) => {
                    tracing::debug!(
                        tenant_id = %tenant.id,
                        sitemap = %sitemap.name(),
                        url_count = sitemap.url_count,
                        size_bytes = sitemap.size_bytes,
                        "Sitemap built"
                    );
                    sitemaps.push(sitemap);
                }
                Err(e) => {
                    // One broken locale/type must not abort the tenant's run.
                    tracing::error!(
                        tenant_id = %tenant.id,
                        sitemap_type = %sitemap_type,
                        locale = %locale,
                        error = %e,
                        "Sitemap build failed"
                    );
                    errors.push(format!("{}-{}: {}", sitemap_type, locale, e));
                }
            }
            // Build phase owns 0-80%; publication owns the rest.
            let pct = (((done + 1) * 80) / total) as u8;
            progress(pct.min(80));
        }

        // The index covers only this run's survivors.
        if request.wants_index() {
            sitemaps.push(builders::build_index(&tenant, &sitemaps, Utc::now()));
        }

        let outcome = self
            .publisher
            .publish(
                &tenant,
                &sitemaps,
                request.upload_to_storage,
                request.ping_search_engines,
            )
            .await;
        errors.extend(outcome.errors);

        self.stamp_last_generated(&tenant.id, &mut errors).await;
        progress(100);

        let total_urls = sitemaps
            .iter()
            .filter(|s| s.sitemap_type != SitemapType::Index)
            .map(|s| s.url_count)
            .sum();

        Ok(SitemapJobResult {
            success: errors.is_empty(),
            skipped: false,
            job_id: request.job_id,
            tenant_id: request.tenant_id.clone(),
            sitemaps: sitemaps
                .iter()
                .map(|s| SitemapMeta {
                    sitemap_type: s.sitemap_type,
                    locale: s.locale.clone(),
                    url_count: s.url_count,
                    size_bytes: s.size_bytes,
                    generated_at: s.generated_at,
                })
                .collect(),
            total_urls,
            duration_ms: elapsed_ms(started),
            storage_urls: request
                .upload_to_storage
                .then_some(outcome.storage_urls),
            ping_results: request
                .ping_search_engines
                .then_some(outcome.ping_results),
            errors: if errors.is_empty() {
                None
            } else {
                Some(errors)
            },
        })
    }

    async fn build_one(
        &self,
        tenant: &Tenant,
        locale: &str,
        sitemap_type: SitemapType,
    ) -> Result<GeneratedSitemap> {
        let now = Utc::now();
        match sitemap_type {
            SitemapType::Products => {
                let products = self
                    .catalog
                    .active_products(&tenant.id, self.config.max_products)
                    .await?;
                Ok(builders::build_products_sitemap(
                    &self.config,
                    tenant,
                    locale,
                    &products,
                    now,
                ))
            }
            SitemapType::Categories => {
                let categories = self.catalog.active_categories(&tenant.id).await?;
                Ok(builders::build_categories_sitemap(
                    &self.config,
                    tenant,
                    locale,
                    &categories,
                    now,
                ))
            }
            SitemapType::Pages => Ok(builders::build_pages_sitemap(
                &self.config,
                tenant,
                locale,
                now,
            )),
            SitemapType::Index => Err(SitemapError::Internal(
                "index is derived after the build loop, not built per locale".to_string(),
            )),
        }
    }

    async fn recently_generated(&self, tenant_id: &str) -> Result<bool> {
        let key = last_generated_key(tenant_id);
        let raw = match self.cache.get(&key).await? {
            Some(raw) => raw,
            None => return Ok(false),
        };
        let stamp = match DateTime::parse_from_rfc3339(&raw) {
            Ok(stamp) => stamp.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(key, error = %e, "Unparseable last-generated stamp, regenerating");
                return Ok(false);
            }
        };
        let threshold = chrono::Duration::from_std(self.config.regeneration_threshold)
            .map_err(|e| SitemapError::Internal(e.to_string()))?;
        Ok(Utc::now() - stamp < threshold)
    }

    async fn stamp_last_generated(&self, tenant_id: &str, errors: &mut Vec<String>) {
        let key = last_generated_key(tenant_id);
        if let Err(e) = self
            .cache
            .set(&key, &Utc::now().to_rfc3339(), self.config.cache_ttl)
            .await
        {
            tracing::warn!(key, error = %e, "Failed to record last-generated stamp");
            errors.push(format!("last-generated stamp: {}", e));
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
