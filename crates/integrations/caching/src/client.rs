//! Typed cache client over any [`CacheStore`].

use std::future::Future;
use std::sync::Arc;

use common::{require_non_blank, AppResult, CacheConfig};
use serde::{de::DeserializeOwned, Serialize};

use crate::options::CacheEntryOptions;
use crate::store::{cache_store, CacheStore};

/// JSON-serializing cache client.
///
/// `set` applies the client's default options; `set_with` takes explicit ones.
pub struct CacheClient<S: CacheStore + ?Sized = dyn CacheStore> {
    store: Arc<S>,
    defaults: CacheEntryOptions,
}

impl<S: CacheStore + ?Sized> Clone for CacheClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            defaults: self.defaults,
        }
    }
}

impl CacheClient {
    /// Build the configured store and use its default TTL for `set`.
    pub async fn connect(config: &CacheConfig) -> AppResult<Self> {
        let store = cache_store(config).await?;
        let defaults = CacheEntryOptions::from_config(config)?;
        Ok(Self::new(store).with_defaults(defaults))
    }
}

impl<S: CacheStore + ?Sized> CacheClient<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            defaults: CacheEntryOptions::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: CacheEntryOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> CacheEntryOptions {
        self.defaults
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        require_non_blank(key, "key")?;
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_with(key, value, self.defaults).await
    }

    pub async fn set_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: CacheEntryOptions,
    ) -> AppResult<()> {
        require_non_blank(key, "key")?;
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, bytes, options).await?;
        tracing::debug!(key = %key, "Cached value");
        Ok(())
    }

    /// Return the cached value, or produce it with `factory` and cache it.
    ///
    /// Factory errors are returned as-is and nothing is cached.
    pub async fn get_or_set_with<T, F, Fut>(
        &self,
        key: &str,
        options: CacheEntryOptions,
        factory: F,
    ) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(hit) = self.get(key).await? {
            return Ok(hit);
        }

        let value = factory().await?;
        self.set_with(key, &value, options).await?;
        Ok(value)
    }

    pub async fn remove(&self, key: &str) -> AppResult<()> {
        require_non_blank(key, "key")?;
        self.store.remove(key).await
    }

    pub async fn refresh(&self, key: &str) -> AppResult<()> {
        require_non_blank(key, "key")?;
        self.store.refresh(key).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use std::time::Duration;

    use common::AppError;
    use serde::Deserialize;

    use super::*;
    use crate::store::{MemoryStore, MockCacheStore};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: u32,
        name: String,
    }

    fn profile() -> Profile {
        Profile {
            id: 7,
            name: "Ada".to_string(),
        }
    }

    fn memory_client() -> CacheClient<MemoryStore> {
        CacheClient::new(Arc::new(MemoryStore::new(100)))
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let client = memory_client();
        client.set("profile:7", &profile()).await.unwrap();

        let cached: Option<Profile> = client.get("profile:7").await.unwrap();
        assert_eq!(cached, Some(profile()));
        assert_eq!(client.get::<Profile>("profile:8").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_key_rejected() {
        let client = memory_client();
        assert!(client.get::<Profile>("").await.unwrap_err().is_invalid_argument());
        assert!(client.set(" ", &1).await.unwrap_err().is_invalid_argument());
        assert!(client.remove("").await.is_err());
        assert!(client.refresh("").await.is_err());
    }

    #[tokio::test]
    async fn test_get_or_set_with_calls_factory_once() {
        let client = memory_client();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = client
                .get_or_set_with("profile:7", CacheEntryOptions::new(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(profile())
                })
                .await
                .unwrap();
            assert_eq!(value, profile());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_factory_error_not_cached() {
        let client = memory_client();
        let err = client
            .get_or_set_with::<Profile, _, _>("profile:7", CacheEntryOptions::new(), || async {
                Err(AppError::NotFound)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(client.get::<Profile>("profile:7").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_bytes_are_serialization_error() {
        let mut store = MockCacheStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(b"not json".to_vec())));

        let client = CacheClient::new(Arc::new(store));
        let err = client.get::<Profile>("profile:7").await.unwrap_err();
        assert_eq!(err.code(), "SERIALIZATION_ERROR");
    }

    #[tokio::test]
    async fn test_set_uses_default_options() {
        let defaults = CacheEntryOptions::new()
            .sliding_expiration(Duration::from_secs(30))
            .unwrap();

        let mut store = MockCacheStore::new();
        store
            .expect_set()
            .withf(move |key, value, options| {
                key.to_string() == "n" && value.as_slice() == b"42" && *options == defaults
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let client = CacheClient::new(Arc::new(store)).with_defaults(defaults);
        client.set("n", &42).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut store = MockCacheStore::new();
        store
            .expect_remove()
            .returning(|_| Err(AppError::cache("Redis DEL failed", "connection refused")));

        let client = CacheClient::new(Arc::new(store));
        let err = client.remove("k").await.unwrap_err();
        assert_eq!(err.code(), "CACHE_ERROR");
    }

    #[tokio::test]
    async fn test_connect_without_url_uses_memory() {
        let client = CacheClient::connect(&CacheConfig::default()).await.unwrap();
        assert_eq!(
            client.defaults().absolute(),
            Some(Duration::from_secs(common::constants::DEFAULT_CACHE_TTL_SECONDS))
        );
        client.set("k", "v").await.unwrap();
        assert_eq!(client.get::<String>("k").await.unwrap(), Some("v".to_string()));
    }
}
