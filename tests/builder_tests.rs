//! Sitemap builder output: URLs, escaping, priorities, index assembly.


use chrono::{TimeZone, Utc};

use sitemapd::config::SitemapConfig;
use sitemapd::sitemap::builders::{
    build_categories_sitemap, build_index, build_pages_sitemap, build_products_sitemap,
};
use sitemapd::sitemap::SitemapType;
use sitemapd::store::{Product, ProductImage};

use test_harness::{test_categories, test_products, test_tenant};

#[test]
fn product_urls_are_absolute_and_locale_scoped() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();
    let now = Utc::now();

    let sitemap = build_products_sitemap(&config, &tenant, "en", &test_products(), now);

    assert_eq!(sitemap.sitemap_type, SitemapType::Products);
    assert_eq!(sitemap.url_count, 3);
    assert!(sitemap
        .xml
        .contains("<loc>https://shop.example/en/products/a</loc>"));
    assert!(sitemap
        .xml
        .contains("<loc>https://shop.example/en/products/b</loc>"));
    // Date-only lastmod from the product's update timestamp.
    assert!(sitemap.xml.contains("<lastmod>2024-05-03</lastmod>"));
    assert!(!sitemap.xml.contains("2024-05-03T"));
}

#[test]
fn product_slugs_are_percent_encoded() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();
    let product = Product {
        id: "p9".to_string(),
        slug: "blue mug".to_string(),
        name: "Blue Mug".to_string(),
        active: true,
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        images: Vec::new(),
    };

    let sitemap = build_products_sitemap(&config, &tenant, "en", &[product], Utc::now());
    assert!(sitemap
        .xml
        .contains("<loc>https://shop.example/en/products/blue%20mug</loc>"));
}

#[test]
fn markup_characters_in_names_are_escaped() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();
    let product = Product {
        id: "p8".to_string(),
        slug: "tom-jerry".to_string(),
        name: "Tom & Jerry <XL> \"mega\"".to_string(),
        active: true,
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        // No image title: the product name is used as fallback and must be
        // escaped on the way into the document.
        images: vec![ProductImage {
            url: "https://cdn.shop.example/t.jpg?size=800&fmt=webp".to_string(),
            title: None,
        }],
    };

    let sitemap = build_products_sitemap(&config, &tenant, "en", &[product], Utc::now());
    assert!(sitemap
        .xml
        .contains("Tom &amp; Jerry &lt;XL&gt; &quot;mega&quot;"));
    assert!(!sitemap.xml.contains("Tom & Jerry"));
    assert!(sitemap.xml.contains("size=800&amp;fmt=webp"));
}

#[test]
fn image_namespace_declared_only_when_needed() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();

    let with_images = build_products_sitemap(&config, &tenant, "en", &test_products(), Utc::now());
    assert!(with_images.xml.contains("xmlns:image="));
    assert!(with_images.xml.contains("<image:loc>"));

    let no_images = build_pages_sitemap(&config, &tenant, "en", Utc::now());
    assert!(!no_images.xml.contains("xmlns:image="));
}

#[test]
fn category_priority_decreases_with_depth() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();

    let sitemap =
        build_categories_sitemap(&config, &tenant, "en", &test_categories(), Utc::now());

    // Depths 0, 1, 2 in fixture order.
    let priorities: Vec<&str> = sitemap
        .xml
        .match_indices("<priority>")
        .map(|(i, _)| &sitemap.xml[i + 10..i + 13])
        .collect();
    assert_eq!(priorities, vec!["0.9", "0.7", "0.6"]);
}

#[test]
fn pages_sitemap_renders_the_full_static_route_table() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();

    let sitemap = build_pages_sitemap(&config, &tenant, "es", Utc::now());

    assert_eq!(sitemap.url_count, 7);
    assert!(sitemap.xml.contains("<loc>https://shop.example/es</loc>"));
    assert!(sitemap.xml.contains("<loc>https://shop.example/es/about</loc>"));
    assert!(sitemap.xml.contains("<loc>https://shop.example/es/returns</loc>"));
}

#[test]
fn index_covers_each_generated_sitemap_exactly_once() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();
    let now = Utc::now();

    let mut generated = vec![
        build_products_sitemap(&config, &tenant, "en", &test_products(), now),
        build_products_sitemap(&config, &tenant, "es", &test_products(), now),
        build_pages_sitemap(&config, &tenant, "en", now),
    ];

    let index = build_index(&tenant, &generated, now);
    assert_eq!(index.sitemap_type, SitemapType::Index);
    assert_eq!(index.url_count, 3);
    assert_eq!(index.xml.matches("<sitemap>").count(), 3);
    assert!(index
        .xml
        .contains("<loc>https://shop.example/sitemaps/products-en.xml</loc>"));
    assert!(index
        .xml
        .contains("<loc>https://shop.example/sitemaps/products-es.xml</loc>"));
    assert!(index
        .xml
        .contains("<loc>https://shop.example/sitemaps/pages-en.xml</loc>"));

    // A prior index in the input must not be referenced again.
    generated.push(index);
    let rebuilt = build_index(&tenant, &generated, now);
    assert_eq!(rebuilt.url_count, 3);
    assert!(!rebuilt.xml.contains("sitemaps/index"));
}

#[test]
fn priorities_stay_within_unit_interval() {
    let config = SitemapConfig::default();
    let tenant = test_tenant();

    let sitemap = build_pages_sitemap(&config, &tenant, "en", Utc::now());
    for (i, _) in sitemap.xml.match_indices("<priority>") {
        let value: f32 = sitemap.xml[i + 10..i + 13].parse().unwrap();
        assert!((0.0..=1.0).contains(&value));
    }
}
