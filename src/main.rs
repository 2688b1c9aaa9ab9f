use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sitemapd::config::SitemapConfig;
use sitemapd::lock::MemoryLockService;
use sitemapd::publish::HttpPinger;
use sitemapd::scheduler::job::SitemapJobRequest;
use sitemapd::service::SitemapService;
use sitemapd::shutdown::install_shutdown_handler;
use sitemapd::sitemap::SitemapType;
use sitemapd::store::memory::{
    MemoryCache, MemoryCatalogStore, MemoryStorage, MemoryTenantStore,
};
use sitemapd::store::{Product, ProductImage, Tenant};

#[derive(Parser, Debug)]
#[command(name = "sitemapd")]
#[command(version)]
#[command(about = "Multi-tenant sitemap generation worker")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the daily scheduler and worker loop until interrupted
    Run(RunArgs),

    /// Generate sitemaps for one tenant immediately and print the result
    Generate(GenerateArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Cron expression for the scheduling pass (5-field, UTC)
    #[arg(long)]
    cron: Option<String>,

    /// Base URL for uploaded sitemap objects
    #[arg(long)]
    storage_base: Option<String>,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Tenant identifier
    #[arg(long)]
    tenant: String,

    /// Comma-separated sitemap types
    #[arg(long, default_value = "index,products,categories,pages")]
    types: String,

    /// Comma-separated locales; empty means the tenant's configured locales
    #[arg(long, default_value = "")]
    locales: String,

    /// Bypass the recently-generated guard
    #[arg(long)]
    force: bool,

    /// Skip the storage upload step
    #[arg(long)]
    no_upload: bool,

    /// Skip search engine pings
    #[arg(long)]
    no_ping: bool,
}

fn parse_types(types_str: &str) -> Vec<SitemapType> {
    types_str
        .split(',')
        .filter_map(|raw| match raw.trim() {
            "index" => Some(SitemapType::Index),
            "products" => Some(SitemapType::Products),
            "categories" => Some(SitemapType::Categories),
            "pages" => Some(SitemapType::Pages),
            "" => None,
            other => {
                tracing::warn!(sitemap_type = other, "Unknown sitemap type, ignoring");
                None
            }
        })
        .collect()
}

fn parse_locales(locales_str: &str) -> Vec<String> {
    locales_str
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Assemble a service over in-memory backends seeded with demo data. The
/// production deployment swaps these for the platform's real stores.
async fn build_demo_service(config: SitemapConfig) -> SitemapService {
    let tenants = Arc::new(MemoryTenantStore::new());
    let catalog = Arc::new(MemoryCatalogStore::new());

    tenants
        .insert(Tenant {
            id: "t1".to_string(),
            domain: "shop.example".to_string(),
            locales: vec!["en".to_string(), "es".to_string()],
            active: true,
            deleted: false,
        })
        .await;
    catalog
        .insert_products(
            "t1",
            vec![
                Product {
                    id: "p1".to_string(),
                    slug: "aurora-lamp".to_string(),
                    name: "Aurora Lamp".to_string(),
                    active: true,
                    updated_at: Utc::now(),
                    images: vec![ProductImage {
                        url: "https://cdn.shop.example/aurora-lamp.jpg".to_string(),
                        title: None,
                    }],
                },
                Product {
                    id: "p2".to_string(),
                    slug: "oak-desk".to_string(),
                    name: "Oak Desk".to_string(),
                    active: true,
                    updated_at: Utc::now(),
                    images: Vec::new(),
                },
            ],
        )
        .await;

    let storage_base = config.storage_base.clone();
    SitemapService::new(
        config,
        tenants,
        catalog,
        Arc::new(MemoryCache::new()),
        Arc::new(MemoryStorage::new(&storage_base)),
        Arc::new(MemoryLockService::new()),
        Arc::new(HttpPinger::new()),
    )
}

async fn run_daemon(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SitemapConfig::default();
    if let Some(cron) = args.cron {
        config.cron = cron;
    }
    if let Some(storage_base) = args.storage_base {
        config.storage_base = storage_base;
    }

    tracing::info!(cron = %config.cron, "Starting sitemapd");
    let service = build_demo_service(config).await;
    let shutdown = install_shutdown_handler();
    service.run(shutdown).await;
    Ok(())
}

async fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let service = build_demo_service(SitemapConfig::default()).await;

    let mut request =
        SitemapJobRequest::manual(&args.tenant, parse_types(&args.types), parse_locales(&args.locales));
    request.force_regenerate = args.force;
    request.upload_to_storage = !args.no_upload;
    request.ping_search_engines = !args.no_ping;

    let result = service.generate_now(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Run(run_args) => run_daemon(run_args).await?,
        Commands::Generate(generate_args) => run_generate(generate_args).await?,
    }
    Ok(())
}
