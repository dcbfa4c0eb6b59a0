//! Redis-backed cache store.
//!
//! Values are stored under `{prefix}{key}`. Entries with sliding expiration
//! carry a side key `{prefix}{key}:sliding` holding the window and the
//! absolute deadline; reads and refreshes push both keys' TTL forward.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::constants::CACHE_SLIDING_SUFFIX;
use common::{AppError, AppResult, CacheConfig};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{Deserialize, Serialize};

use crate::options::{slide, CacheEntryOptions};
use crate::store::CacheStore;

/// Convert Redis error to AppError.
fn cache_error(operation: &str, e: RedisError) -> AppError {
    tracing::error!("Redis error during {}: {}", operation, e);
    AppError::cache(format!("Redis {} failed", operation), e)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Sliding expiration metadata kept next to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SlidingMeta {
    sliding_ms: u64,
    /// Unix milliseconds of the absolute deadline
    deadline_ms: Option<i64>,
}

impl SlidingMeta {
    fn from_options(options: &CacheEntryOptions, now_ms: i64) -> Option<Self> {
        let sliding = options.sliding()?;
        Some(Self {
            sliding_ms: millis(sliding),
            deadline_ms: options
                .absolute()
                .map(|ttl| now_ms.saturating_add(millis(ttl) as i64)),
        })
    }

    /// TTL after an access at `now_ms`, or `None` once past the deadline.
    fn next_ttl(&self, now_ms: i64) -> Option<Duration> {
        let remaining = self
            .deadline_ms
            .map(|deadline| Duration::from_millis(deadline.saturating_sub(now_ms).max(0) as u64));
        slide(Duration::from_millis(self.sliding_ms), remaining)
    }
}

/// Redis cache store with connection pooling.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            connection,
            key_prefix: key_prefix.into(),
        }
    }

    /// Connect to Redis, returning an error instead of panicking.
    pub async fn connect(config: &CacheConfig) -> AppResult<Self> {
        let client =
            Client::open(config.redis_url()).map_err(|e| cache_error("client setup", e))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| cache_error("connect", e))?;

        tracing::info!("Redis cache connected");
        Ok(Self::new(connection, config.key_prefix.clone()))
    }

    fn value_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    fn sliding_key(&self, key: &str) -> String {
        format!("{}{}{}", self.key_prefix, key, CACHE_SLIDING_SUFFIX)
    }

    /// Push both keys' TTL forward. Returns `false` if the entry is past its deadline.
    async fn slide_keys(&self, key: &str, meta: &[u8]) -> AppResult<bool> {
        let meta: SlidingMeta = serde_json::from_slice(meta)?;
        let mut conn = self.connection.clone();
        let value_key = self.value_key(key);
        let sliding_key = self.sliding_key(key);

        match meta.next_ttl(Utc::now().timestamp_millis()) {
            Some(ttl) => {
                let ms = millis(ttl) as i64;
                let _: () = redis::pipe()
                    .pexpire(&value_key, ms)
                    .ignore()
                    .pexpire(&sliding_key, ms)
                    .ignore()
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| cache_error("PEXPIRE", e))?;
                Ok(true)
            }
            None => {
                let _: () = conn
                    .del(vec![value_key, sliding_key])
                    .await
                    .map_err(|e| cache_error("DEL", e))?;
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let (value, meta): (Option<Vec<u8>>, Option<Vec<u8>>) = redis::pipe()
            .get(self.value_key(key))
            .get(self.sliding_key(key))
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_error("GET", e))?;

        match (value, meta) {
            (Some(value), Some(meta)) => {
                if self.slide_keys(key, &meta).await? {
                    Ok(Some(value))
                } else {
                    Ok(None)
                }
            }
            (value, _) => Ok(value),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, options: CacheEntryOptions) -> AppResult<()> {
        let value_key = self.value_key(key);
        let sliding_key = self.sliding_key(key);
        let meta = SlidingMeta::from_options(&options, Utc::now().timestamp_millis());

        let mut pipe = redis::pipe();
        pipe.atomic();
        match options.initial_ttl() {
            Some(ttl) => pipe.pset_ex(&value_key, value, millis(ttl)).ignore(),
            None => pipe.set(&value_key, value).ignore(),
        };
        match (meta, options.initial_ttl()) {
            (Some(meta), Some(ttl)) => pipe
                .pset_ex(&sliding_key, serde_json::to_vec(&meta)?, millis(ttl))
                .ignore(),
            _ => pipe.del(&sliding_key).ignore(),
        };

        let mut conn = self.connection.clone();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_error("SET", e))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn
            .del(vec![self.value_key(key), self.sliding_key(key)])
            .await
            .map_err(|e| cache_error("DEL", e))?;
        Ok(())
    }

    async fn refresh(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let meta: Option<Vec<u8>> = conn
            .get(self.sliding_key(key))
            .await
            .map_err(|e| cache_error("GET", e))?;

        if let Some(meta) = meta {
            self.slide_keys(key, &meta).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_only_for_sliding_entries() {
        let absolute = CacheEntryOptions::new()
            .absolute_expiration_relative_to_now(Duration::from_secs(5))
            .unwrap();
        assert!(SlidingMeta::from_options(&absolute, 0).is_none());

        let both = absolute.sliding_expiration(Duration::from_secs(2)).unwrap();
        let meta = SlidingMeta::from_options(&both, 1_000).unwrap();
        assert_eq!(meta.sliding_ms, 2_000);
        assert_eq!(meta.deadline_ms, Some(6_000));
    }

    #[test]
    fn test_next_ttl_capped_by_deadline() {
        let meta = SlidingMeta {
            sliding_ms: 2_000,
            deadline_ms: Some(6_000),
        };
        assert_eq!(meta.next_ttl(1_000), Some(Duration::from_secs(2)));
        assert_eq!(meta.next_ttl(5_500), Some(Duration::from_millis(500)));
        assert_eq!(meta.next_ttl(7_000), None);

        let open = SlidingMeta {
            sliding_ms: 2_000,
            deadline_ms: None,
        };
        assert_eq!(open.next_ttl(i64::MAX), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_meta_serializes_as_json() {
        let meta = SlidingMeta {
            sliding_ms: 100,
            deadline_ms: None,
        };
        let bytes = serde_json::to_vec(&meta).unwrap();
        assert_eq!(serde_json::from_slice::<SlidingMeta>(&bytes).unwrap(), meta);
    }

    #[tokio::test]
    async fn test_invalid_url_is_cache_error() {
        let config = CacheConfig {
            url: Some("not-a-url".to_string()),
            ..CacheConfig::default()
        };
        let err = RedisStore::connect(&config).await.err().unwrap();
        assert_eq!(err.code(), "CACHE_ERROR");
    }
}
