//! Tenant-scoped mutual exclusion for generation runs.
//!
//! The lock contract mirrors a Redis-style conditional set: non-blocking
//! acquire-or-fail, a TTL safety net against crashed holders, and release
//! gated on the token handed out at acquisition so no other process can
//! release a lock it doesn't own.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, SitemapError};

/// Proof of lock ownership, required to release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(pub Uuid);

/// Lock key for one tenant's generation run.
pub fn tenant_lock_key(tenant_id: &str) -> String {
    format!("sitemap:{}", tenant_id)
}

#[async_trait]
pub trait LockService: Send + Sync {
    /// Try to acquire `key` for `ttl`. Retries until `wait` has elapsed;
    /// with a zero `wait` this is a single non-blocking attempt. Returns
    /// `None` when the lock is held by someone else.
    async fn acquire(&self, key: &str, ttl: Duration, wait: Duration) -> Result<Option<LockToken>>;

    /// Release `key` if `token` matches the current holder. Returns whether
    /// the lock was actually released.
    async fn release(&self, key: &str, token: &LockToken) -> Result<bool>;
}

#[derive(Debug, Clone)]
struct Holder {
    token: Uuid,
    expires_at: DateTime<Utc>,
}

/// Single-process lock service backed by a map. Stands in for the
/// platform's distributed lock in tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryLockService {
    holders: Mutex<HashMap<String, Holder>>,
}

impl MemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }

    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockToken>> {
        let mut holders = self.holders.lock().await;
        let now = Utc::now();
        if let Some(holder) = holders.get(key) {
            if holder.expires_at > now {
                return Ok(None);
            }
        }
        let token = Uuid::new_v4();
        let expires_at = now
            + chrono::Duration::from_std(ttl).map_err(|e| SitemapError::Lock(e.to_string()))?;
        holders.insert(key.to_string(), Holder { token, expires_at });
        Ok(Some(LockToken(token)))
    }
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn acquire(&self, key: &str, ttl: Duration, wait: Duration) -> Result<Option<LockToken>> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            if let Some(token) = self.try_acquire(key, ttl).await? {
                return Ok(Some(token));
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn release(&self, key: &str, token: &LockToken) -> Result<bool> {
        let mut holders = self.holders.lock().await;
        match holders.get(key) {
            Some(holder) if holder.token == token.0 => {
                holders.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_is_exclusive() {
        let lock = MemoryLockService::new();
        let ttl = Duration::from_secs(60);

        let token = lock.acquire("sitemap:t1", ttl, Duration::ZERO).await.unwrap();
        assert!(token.is_some());

        let second = lock.acquire("sitemap:t1", ttl, Duration::ZERO).await.unwrap();
        assert!(second.is_none());

        // Independent keys do not interfere.
        let other = lock.acquire("sitemap:t2", ttl, Duration::ZERO).await.unwrap();
        assert!(other.is_some());
    }

    #[tokio::test]
    async fn release_requires_matching_token() {
        let lock = MemoryLockService::new();
        let ttl = Duration::from_secs(60);

        let token = lock
            .acquire("sitemap:t1", ttl, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();

        let stranger = LockToken(Uuid::new_v4());
        assert!(!lock.release("sitemap:t1", &stranger).await.unwrap());

        assert!(lock.release("sitemap:t1", &token).await.unwrap());
        // Released: a new acquire succeeds.
        assert!(lock
            .acquire("sitemap:t1", ttl, Duration::ZERO)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn expired_lock_can_be_reacquired() {
        let lock = MemoryLockService::new();

        let first = lock
            .acquire("sitemap:t1", Duration::from_millis(20), Duration::ZERO)
            .await
            .unwrap();
        assert!(first.is_some());

        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = lock
            .acquire("sitemap:t1", Duration::from_secs(60), Duration::ZERO)
            .await
            .unwrap();
        assert!(second.is_some());

        // The first holder's token no longer releases the lock.
        assert!(!lock
            .release("sitemap:t1", &first.unwrap())
            .await
            .unwrap());
    }
}
