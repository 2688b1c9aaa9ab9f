//! Sitemap document model and builders.
//!
//! This module turns stored entities into sitemap-protocol XML:
//! - [`builders`]: per-type builders (products, categories, pages) and the
//!   sitemap index builder
//! - [`xml`]: escaping and `<urlset>`/`<sitemapindex>` rendering
//!
//! Builders are pure: they take already-fetched entities plus tenant/locale
//! context and return a [`GeneratedSitemap`]. All database access happens in
//! the coordinator, which keeps these functions trivially testable.

pub mod builders;
pub mod xml;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of sitemap document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SitemapType {
    Index,
    Products,
    Categories,
    Pages,
}

impl std::fmt::Display for SitemapType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SitemapType::Index => write!(f, "index"),
            SitemapType::Products => write!(f, "products"),
            SitemapType::Categories => write!(f, "categories"),
            SitemapType::Pages => write!(f, "pages"),
        }
    }
}

/// Change-frequency hint per the sitemap protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Always => "always",
            ChangeFrequency::Hourly => "hourly",
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
            ChangeFrequency::Never => "never",
        }
    }
}

impl std::fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image sub-entry attached to a URL (`<image:image>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapImage {
    pub loc: String,
    pub title: Option<String>,
}

/// One `<url>` entry in a urlset. Immutable once built.
#[derive(Debug, Clone)]
pub struct SitemapUrl {
    /// Absolute, tenant- and locale-scoped location.
    pub loc: String,
    /// Date-only last-modified stamp (`YYYY-MM-DD` in the XML).
    pub lastmod: Option<NaiveDate>,
    pub changefreq: ChangeFrequency,
    /// Priority weight, clamped to [0.0, 1.0] at render time.
    pub priority: f32,
    pub images: Vec<SitemapImage>,
}

/// A generated sitemap document, held in memory until cached/uploaded.
#[derive(Debug, Clone)]
pub struct GeneratedSitemap {
    pub sitemap_type: SitemapType,
    pub locale: String,
    pub url_count: usize,
    pub size_bytes: usize,
    pub xml: String,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedSitemap {
    /// Logical name used for cache keys, storage objects and result maps,
    /// e.g. `products-en`. The index is locale-independent.
    pub fn name(&self) -> String {
        match self.sitemap_type {
            SitemapType::Index => "index".to_string(),
            _ => format!("{}-{}", self.sitemap_type, self.locale),
        }
    }
}
