use std::time::Duration;

use crate::sitemap::ChangeFrequency;

/// One static storefront route rendered into the pages sitemap.
#[derive(Debug, Clone)]
pub struct StaticPage {
    /// Path segment under the locale prefix. Empty string is the home page.
    pub path: &'static str,
    pub priority: f32,
    pub changefreq: ChangeFrequency,
}

/// A search engine that accepts sitemap submission pings.
#[derive(Debug, Clone)]
pub struct PingEndpoint {
    pub name: String,
    /// GET URL template; `{sitemap_url}` is replaced with the
    /// percent-encoded sitemap index URL.
    pub url_template: String,
}

/// Configuration for the sitemap generation subsystem.
#[derive(Debug, Clone)]
pub struct SitemapConfig {
    /// Cron expression for the daily scheduling pass (5-field, UTC).
    pub cron: String,
    /// Upper bound for the random per-tenant enqueue delay.
    pub max_jitter: Duration,
    /// TTL on the per-tenant generation lock.
    pub lock_ttl: Duration,
    /// Minimum time between completed generations without `forceRegenerate`.
    pub regeneration_threshold: Duration,
    /// TTL on cached sitemap documents.
    pub cache_ttl: Duration,
    /// Hard cap on products per sitemap, per the sitemap protocol limit.
    pub max_products: usize,
    /// Base URL of the durable storage bucket, without trailing slash.
    pub storage_base: String,
    /// Default priority for product URLs.
    pub product_priority: f32,
    /// Default change frequency for product URLs.
    pub product_changefreq: ChangeFrequency,
    /// Default change frequency for category URLs.
    pub category_changefreq: ChangeFrequency,
    /// Static routes rendered into each locale's pages sitemap.
    pub static_pages: Vec<StaticPage>,
    /// Search engines pinged after a successful upload.
    pub ping_endpoints: Vec<PingEndpoint>,
    /// Maximum number of jobs the in-process queue will hold.
    pub max_queued_jobs: usize,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            cron: "0 3 * * *".to_string(),
            max_jitter: Duration::from_secs(5 * 60),
            lock_ttl: Duration::from_secs(10 * 60),
            regeneration_threshold: Duration::from_secs(12 * 60 * 60),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            max_products: 50_000,
            storage_base: "https://storage.example.com/sitemaps".to_string(),
            product_priority: 0.8,
            product_changefreq: ChangeFrequency::Daily,
            category_changefreq: ChangeFrequency::Weekly,
            static_pages: default_static_pages(),
            ping_endpoints: default_ping_endpoints(),
            max_queued_jobs: 10_000,
        }
    }
}

impl SitemapConfig {
    /// Priority tier for a category at the given hierarchy depth.
    /// Deterministic and non-increasing in depth.
    pub fn category_priority(&self, depth: u32) -> f32 {
        match depth {
            0 => 0.9,
            1 => 0.7,
            2 => 0.6,
            _ => 0.5,
        }
    }
}

fn default_static_pages() -> Vec<StaticPage> {
    vec![
        StaticPage {
            path: "",
            priority: 1.0,
            changefreq: ChangeFrequency::Daily,
        },
        StaticPage {
            path: "about",
            priority: 0.6,
            changefreq: ChangeFrequency::Monthly,
        },
        StaticPage {
            path: "contact",
            priority: 0.6,
            changefreq: ChangeFrequency::Monthly,
        },
        StaticPage {
            path: "privacy",
            priority: 0.3,
            changefreq: ChangeFrequency::Yearly,
        },
        StaticPage {
            path: "terms",
            priority: 0.3,
            changefreq: ChangeFrequency::Yearly,
        },
        StaticPage {
            path: "shipping",
            priority: 0.5,
            changefreq: ChangeFrequency::Monthly,
        },
        StaticPage {
            path: "returns",
            priority: 0.5,
            changefreq: ChangeFrequency::Monthly,
        },
    ]
}

fn default_ping_endpoints() -> Vec<PingEndpoint> {
    vec![
        PingEndpoint {
            name: "google".to_string(),
            url_template: "https://www.google.com/ping?sitemap={sitemap_url}".to_string(),
        },
        PingEndpoint {
            name: "bing".to_string(),
            url_template: "https://www.bing.com/ping?sitemap={sitemap_url}".to_string(),
        },
    ]
}
