//! Distributed cache: Redis and in-memory stores behind a typed client.

pub mod client;
pub mod options;
pub mod redis_store;
pub mod store;

pub use client::CacheClient;
pub use options::CacheEntryOptions;
pub use redis_store::RedisStore;
pub use store::{cache_store, CacheStore, MemoryStore};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockCacheStore;
