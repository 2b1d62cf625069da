// # Memory Cache Store
//
// In-memory implementation of CacheStore.
//
// Nothing survives the process. Useful for tests, embedding, and one-off
// runs that should not leave a cache file behind. Clones share state.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::state::Cache;
use crate::traits::cache_store::CacheStore;

/// In-memory cache store implementation
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<RwLock<Cache>>,
    save_count: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl MemoryCacheStore {
    /// Create a store holding an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `cache`
    pub fn with_cache(cache: Cache) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
            ..Self::default()
        }
    }

    /// Current stored cache
    pub async fn snapshot(&self) -> Cache {
        self.inner.read().await.clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail (simulates an unwritable cache)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load(&self) -> Cache {
        self.inner.read().await.clone()
    }

    async fn save(&self, cache: &Cache) -> Result<(), Error> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::cache("memory store configured to fail saves"));
        }

        *self.inner.write().await = cache.clone();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
