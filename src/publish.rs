//! Publication pipeline: cache, upload, announce.
//!
//! Takes the generated documents for one run and (1) caches the raw XML
//! under tenant-scoped keys, (2) uploads them to durable storage when
//! requested, and (3) pings search engines with the index URL. Pings are
//! strictly best effort: per-engine outcomes are recorded and never fail
//! the run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{PingEndpoint, SitemapConfig};
use crate::scheduler::job::SearchEnginePingResult;
use crate::sitemap::{GeneratedSitemap, SitemapType};
use crate::store::{index_cache_key, sitemap_cache_key, Cache, ObjectStorage, Tenant};

/// Outcome of one publication pass. `errors` holds cache/upload failures;
/// ping failures live only in `ping_results`.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    pub storage_urls: HashMap<String, String>,
    pub index_url: Option<String>,
    pub ping_results: Vec<SearchEnginePingResult>,
    pub errors: Vec<String>,
}

/// Submits a sitemap URL to one search engine.
#[async_trait]
pub trait SearchEnginePinger: Send + Sync {
    async fn ping(&self, endpoint: &PingEndpoint, sitemap_url: &str) -> SearchEnginePingResult;
}

/// Real pinger: GET against the engine's submission endpoint.
pub struct HttpPinger {
    client: reqwest::Client,
}

impl HttpPinger {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpPinger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchEnginePinger for HttpPinger {
    async fn ping(&self, endpoint: &PingEndpoint, sitemap_url: &str) -> SearchEnginePingResult {
        let url = endpoint
            .url_template
            .replace("{sitemap_url}", &urlencoding::encode(sitemap_url));

        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                SearchEnginePingResult {
                    engine: endpoint.name.clone(),
                    success: status.is_success(),
                    status: Some(status.as_u16()),
                    error: if status.is_success() {
                        None
                    } else {
                        Some(format!("HTTP {}", status.as_u16()))
                    },
                }
            }
            Err(e) => SearchEnginePingResult {
                engine: endpoint.name.clone(),
                success: false,
                status: None,
                error: Some(e.to_string()),
            },
        }
    }
}

pub struct Publisher {
    cache: Arc<dyn Cache>,
    storage: Arc<dyn ObjectStorage>,
    pinger: Arc<dyn SearchEnginePinger>,
    config: Arc<SitemapConfig>,
}

impl Publisher {
    pub fn new(
        cache: Arc<dyn Cache>,
        storage: Arc<dyn ObjectStorage>,
        pinger: Arc<dyn SearchEnginePinger>,
        config: Arc<SitemapConfig>,
    ) -> Self {
        Self {
            cache,
            storage,
            pinger,
            config,
        }
    }

    /// Publish one run's sitemaps for `tenant`.
    pub async fn publish(
        &self,
        tenant: &Tenant,
        sitemaps: &[GeneratedSitemap],
        upload: bool,
        ping: bool,
    ) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();

        for sitemap in sitemaps {
            self.cache_sitemap(tenant, sitemap, &mut outcome).await;
        }

        if upload {
            for sitemap in sitemaps {
                self.upload_sitemap(tenant, sitemap, &mut outcome).await;
            }
        }

        if ping {
            match &outcome.index_url {
                Some(index_url) => {
                    for endpoint in &self.config.ping_endpoints {
                        let result = self.pinger.ping(endpoint, index_url).await;
                        if result.success {
                            tracing::debug!(engine = %result.engine, "Search engine pinged");
                        } else {
                            tracing::warn!(
                                engine = %result.engine,
                                error = ?result.error,
                                "Search engine ping failed"
                            );
                        }
                        outcome.ping_results.push(result);
                    }
                }
                None => {
                    tracing::debug!(
                        tenant_id = %tenant.id,
                        "Skipping search engine pings, no index URL available"
                    );
                }
            }
        }

        outcome
    }

    async fn cache_sitemap(
        &self,
        tenant: &Tenant,
        sitemap: &GeneratedSitemap,
        outcome: &mut PublishOutcome,
    ) {
        let key = if sitemap.sitemap_type == SitemapType::Index {
            index_cache_key(&tenant.id)
        } else {
            sitemap_cache_key(&tenant.id, &sitemap.locale, &sitemap.sitemap_type.to_string())
        };
        if let Err(e) = self
            .cache
            .set(&key, &sitemap.xml, self.config.cache_ttl)
            .await
        {
            tracing::warn!(key, error = %e, "Failed to cache sitemap");
            outcome.errors.push(format!("cache {}: {}", key, e));
        }
    }

    async fn upload_sitemap(
        &self,
        tenant: &Tenant,
        sitemap: &GeneratedSitemap,
        outcome: &mut PublishOutcome,
    ) {
        let (name, object_key) = if sitemap.sitemap_type == SitemapType::Index {
            ("index".to_string(), format!("{}/sitemap.xml", tenant.id))
        } else {
            (
                sitemap.name(),
                format!("{}/{}.xml", tenant.id, sitemap.name()),
            )
        };

        match self
            .storage
            .put(&object_key, &sitemap.xml, "application/xml")
            .await
        {
            Ok(url) => {
                if sitemap.sitemap_type == SitemapType::Index {
                    outcome.index_url = Some(url.clone());
                }
                outcome.storage_urls.insert(name, url);
            }
            Err(e) => {
                tracing::warn!(object_key, error = %e, "Failed to upload sitemap");
                outcome.errors.push(format!("upload {}: {}", object_key, e));
            }
        }
    }
}
