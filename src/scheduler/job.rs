use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sitemap::SitemapType;
use crate::store::Tenant;

/// Where a generation job came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    Scheduler,
    Manual,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::Scheduler => write!(f, "scheduler"),
            TriggerSource::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One sitemap generation job for one tenant. Consumed once by the
/// coordinator; the queue's own retention governs redelivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapJobRequest {
    pub job_id: Uuid,
    pub tenant_id: String,
    pub types: Vec<SitemapType>,
    pub locales: Vec<String>,
    pub force_regenerate: bool,
    pub upload_to_storage: bool,
    pub ping_search_engines: bool,
    pub triggered_by: TriggerSource,
}

impl SitemapJobRequest {
    /// The request the daily scheduler enqueues: every type, the tenant's
    /// locales, upload and ping enabled.
    pub fn scheduled(tenant: &Tenant) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            tenant_id: tenant.id.clone(),
            types: vec![
                SitemapType::Index,
                SitemapType::Products,
                SitemapType::Categories,
                SitemapType::Pages,
            ],
            locales: tenant.effective_locales(),
            force_regenerate: false,
            upload_to_storage: true,
            ping_search_engines: true,
            triggered_by: TriggerSource::Scheduler,
        }
    }

    pub fn manual(tenant_id: &str, types: Vec<SitemapType>, locales: Vec<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            types,
            locales,
            force_regenerate: false,
            upload_to_storage: true,
            ping_search_engines: true,
            triggered_by: TriggerSource::Manual,
        }
    }

    /// Requested (locale, type) build combinations, index excluded. The
    /// index is derived from the survivors afterwards.
    pub fn combinations(&self, fallback_locales: &[String]) -> Vec<(String, SitemapType)> {
        let locales: Vec<String> = if self.locales.is_empty() {
            fallback_locales.to_vec()
        } else {
            self.locales.clone()
        };
        let mut combos = Vec::new();
        for locale in &locales {
            for ty in &self.types {
                if *ty != SitemapType::Index {
                    combos.push((locale.clone(), *ty));
                }
            }
        }
        combos
    }

    pub fn wants_index(&self) -> bool {
        self.types.contains(&SitemapType::Index)
    }
}

/// Metadata about one generated sitemap, surfaced in the job result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapMeta {
    #[serde(rename = "type")]
    pub sitemap_type: SitemapType,
    pub locale: String,
    pub url_count: usize,
    pub size_bytes: usize,
    pub generated_at: DateTime<Utc>,
}

/// Outcome of pinging one search engine. Best effort only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEnginePingResult {
    pub engine: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final result of one coordinator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapJobResult {
    pub success: bool,
    /// True for deliberate no-ops: lock already held or recently generated.
    pub skipped: bool,
    pub job_id: Uuid,
    pub tenant_id: String,
    pub sitemaps: Vec<SitemapMeta>,
    pub total_urls: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_urls: Option<std::collections::HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_results: Option<Vec<SearchEnginePingResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl SitemapJobResult {
    /// A no-op result: zero work done, reported as success with a note.
    pub fn skipped(request: &SitemapJobRequest, note: &str, duration_ms: u64) -> Self {
        Self {
            success: true,
            skipped: true,
            job_id: request.job_id,
            tenant_id: request.tenant_id.clone(),
            sitemaps: Vec::new(),
            total_urls: 0,
            duration_ms,
            storage_urls: None,
            ping_results: None,
            errors: Some(vec![note.to_string()]),
        }
    }
}
