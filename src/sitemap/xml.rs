//! Sitemap XML rendering.
//!
//! Documents are assembled by hand: the sitemap protocol is a flat, fixed
//! schema and every text node goes through [`escape`], so the output stays
//! well-formed even when product names contain markup characters.

use chrono::NaiveDate;

use crate::sitemap::SitemapUrl;

const URLSET_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Escape text for use inside an XML element or attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn format_priority(priority: f32) -> String {
    let clamped = priority.clamp(0.0, 1.0);
    // One decimal is enough for the tiers we emit; avoids "0.700000" noise.
    format!("{:.1}", clamped)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Render a `<urlset>` document. The image namespace is declared only when
/// at least one URL carries image entries.
pub fn render_urlset(urls: &[SitemapUrl]) -> String {
    let has_images = urls.iter().any(|u| !u.images.is_empty());

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{}\"", URLSET_NS));
    if has_images {
        xml.push_str(&format!(" xmlns:image=\"{}\"", IMAGE_NS));
    }
    xml.push_str(">\n");

    for url in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(&url.loc)));
        if let Some(lastmod) = url.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", format_date(lastmod)));
        }
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            url.changefreq.as_str()
        ));
        xml.push_str(&format!(
            "    <priority>{}</priority>\n",
            format_priority(url.priority)
        ));
        for image in &url.images {
            xml.push_str("    <image:image>\n");
            xml.push_str(&format!(
                "      <image:loc>{}</image:loc>\n",
                escape(&image.loc)
            ));
            if let Some(title) = &image.title {
                xml.push_str(&format!(
                    "      <image:title>{}</image:title>\n",
                    escape(title)
                ));
            }
            xml.push_str("    </image:image>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// One entry in a sitemap index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
}

/// Render a `<sitemapindex>` document.
pub fn render_index(entries: &[IndexEntry]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<sitemapindex xmlns=\"{}\">\n", URLSET_NS));
    for entry in entries {
        xml.push_str("  <sitemap>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(&entry.loc)));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            format_date(entry.lastmod)
        ));
        xml.push_str("  </sitemap>\n");
    }
    xml.push_str("</sitemapindex>\n");
    xml
}
