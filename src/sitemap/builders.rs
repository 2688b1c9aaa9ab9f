//! Per-type sitemap builders.
//!
//! Every builder produces absolute, locale-scoped URLs under the tenant's
//! domain (`https://{domain}/{locale}/...`) and renders them through
//! [`xml`](crate::sitemap::xml). Slugs are percent-encoded so stored slugs
//! with unusual characters cannot break the URL or the document.

use chrono::{DateTime, Utc};

use crate::config::SitemapConfig;
use crate::sitemap::xml::{self, IndexEntry};
use crate::sitemap::{GeneratedSitemap, SitemapImage, SitemapType, SitemapUrl};
use crate::store::{Category, Product, Tenant};

fn slug_or_id<'a>(slug: &'a str, id: &'a str) -> &'a str {
    if slug.is_empty() {
        id
    } else {
        slug
    }
}

fn finish(
    sitemap_type: SitemapType,
    locale: &str,
    urls: Vec<SitemapUrl>,
    generated_at: DateTime<Utc>,
) -> GeneratedSitemap {
    let xml = xml::render_urlset(&urls);
    GeneratedSitemap {
        sitemap_type,
        locale: locale.to_string(),
        url_count: urls.len(),
        size_bytes: xml.len(),
        xml,
        generated_at,
    }
}

/// Build the products sitemap for one tenant/locale.
pub fn build_products_sitemap(
    config: &SitemapConfig,
    tenant: &Tenant,
    locale: &str,
    products: &[Product],
    now: DateTime<Utc>,
) -> GeneratedSitemap {
    let base = tenant.base_url();
    let urls: Vec<SitemapUrl> = products
        .iter()
        .map(|product| {
            let slug = slug_or_id(&product.slug, &product.id);
            SitemapUrl {
                loc: format!("{}/{}/products/{}", base, locale, urlencoding::encode(slug)),
                lastmod: Some(product.updated_at.date_naive()),
                changefreq: config.product_changefreq,
                priority: config.product_priority,
                images: product
                    .images
                    .iter()
                    .map(|image| SitemapImage {
                        loc: image.url.clone(),
                        title: image.title.clone().or_else(|| Some(product.name.clone())),
                    })
                    .collect(),
            }
        })
        .collect();
    finish(SitemapType::Products, locale, urls, now)
}

/// Build the categories sitemap. Priority tiers off hierarchy depth,
/// top-level categories ranking highest.
pub fn build_categories_sitemap(
    config: &SitemapConfig,
    tenant: &Tenant,
    locale: &str,
    categories: &[Category],
    now: DateTime<Utc>,
) -> GeneratedSitemap {
    let base = tenant.base_url();
    let urls: Vec<SitemapUrl> = categories
        .iter()
        .map(|category| {
            let slug = slug_or_id(&category.slug, &category.id);
            SitemapUrl {
                loc: format!(
                    "{}/{}/categories/{}",
                    base,
                    locale,
                    urlencoding::encode(slug)
                ),
                lastmod: Some(category.updated_at.date_naive()),
                changefreq: config.category_changefreq,
                priority: config.category_priority(category.depth),
                images: Vec::new(),
            }
        })
        .collect();
    finish(SitemapType::Categories, locale, urls, now)
}

/// Build the static pages sitemap from the configured route table.
pub fn build_pages_sitemap(
    config: &SitemapConfig,
    tenant: &Tenant,
    locale: &str,
    now: DateTime<Utc>,
) -> GeneratedSitemap {
    let base = tenant.base_url();
    let urls: Vec<SitemapUrl> = config
        .static_pages
        .iter()
        .map(|page| {
            let loc = if page.path.is_empty() {
                format!("{}/{}", base, locale)
            } else {
                format!("{}/{}/{}", base, locale, page.path)
            };
            SitemapUrl {
                loc,
                lastmod: Some(now.date_naive()),
                changefreq: page.changefreq,
                priority: page.priority,
                images: Vec::new(),
            }
        })
        .collect();
    finish(SitemapType::Pages, locale, urls, now)
}

/// Build the sitemap index over this run's generated documents. Any prior
/// index in the input is ignored; entries share `now` as their lastmod.
pub fn build_index(
    tenant: &Tenant,
    sitemaps: &[GeneratedSitemap],
    now: DateTime<Utc>,
) -> GeneratedSitemap {
    let base = tenant.base_url();
    let entries: Vec<IndexEntry> = sitemaps
        .iter()
        .filter(|s| s.sitemap_type != SitemapType::Index)
        .map(|s| IndexEntry {
            loc: format!("{}/sitemaps/{}.xml", base, s.name()),
            lastmod: now.date_naive(),
        })
        .collect();
    let xml = xml::render_index(&entries);
    GeneratedSitemap {
        sitemap_type: SitemapType::Index,
        locale: String::new(),
        url_count: entries.len(),
        size_bytes: xml.len(),
        xml,
        generated_at: now,
    }
}
