//! Byte-level cache store abstraction and the in-memory implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::{AppResult, CacheConfig};
use moka::future::Cache;
use moka::Expiry;

use crate::options::{slide, CacheEntryOptions};
use crate::redis_store::RedisStore;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Distributed cache over raw bytes.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, options: CacheEntryOptions) -> AppResult<()>;

    async fn remove(&self, key: &str) -> AppResult<()>;

    /// Reset the sliding window of an entry without reading it.
    async fn refresh(&self, key: &str) -> AppResult<()>;
}

#[derive(Clone)]
struct MemoryEntry {
    value: Arc<Vec<u8>>,
    sliding: Option<Duration>,
    deadline: Option<Instant>,
}

impl MemoryEntry {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    fn ttl_at(&self, now: Instant) -> Option<Duration> {
        match self.sliding {
            Some(window) => Some(slide(window, self.remaining(now)).unwrap_or(Duration::ZERO)),
            None => self.remaining(now),
        }
    }
}

struct EntryExpiry;

impl Expiry<String, MemoryEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &MemoryEntry,
        created_at: Instant,
    ) -> Option<Duration> {
        value.ttl_at(created_at)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &MemoryEntry,
        read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        match value.sliding {
            Some(_) => value.ttl_at(read_at),
            None => duration_until_expiry,
        }
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &MemoryEntry,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl_at(updated_at)
    }
}

/// Process-local store with per-entry expiration.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();
        Self { cache }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value.to_vec()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, options: CacheEntryOptions) -> AppResult<()> {
        let entry = MemoryEntry {
            value: Arc::new(value),
            sliding: options.sliding(),
            deadline: options.absolute().map(|ttl| Instant::now() + ttl),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn refresh(&self, key: &str) -> AppResult<()> {
        // A read resets the sliding window.
        let _ = self.cache.get(key).await;
        Ok(())
    }
}

/// Redis when a URL is configured, the in-memory store otherwise.
pub async fn cache_store(config: &CacheConfig) -> AppResult<Arc<dyn CacheStore>> {
    match &config.url {
        Some(_) => Ok(Arc::new(RedisStore::connect(config).await?)),
        None => {
            tracing::warn!("Redis not configured - using in-memory cache");
            Ok(Arc::new(MemoryStore::new(config.memory_capacity)))
        }
    }
}
