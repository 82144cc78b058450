//! In-memory set cache.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::cache::{CacheBase, CacheEntry, ExpiringStore, SetCache};
use crate::config::MemoryCacheOptions;
use crate::duration::Expiry;
use crate::error::Result;
use crate::tasks::{current_runtime, spawn_sweep_task};

// == Memory Set Cache ==
/// Process-local set of unique values.
///
/// Two values are the same member when their JSON encodings are equal.
/// Members expire like [`MemoryMapCache`](super::MemoryMapCache) entries.
#[derive(Debug)]
pub struct MemorySetCache<V> {
    base: CacheBase,
    store: Arc<RwLock<ExpiringStore<V>>>,
    sweeper: JoinHandle<()>,
}

impl<V> MemorySetCache<V>
where
    V: Serialize + Clone + Send + Sync + 'static,
{
    pub fn new() -> Result<Self> {
        Self::with_options(MemoryCacheOptions::default())
    }

    pub fn with_options(options: MemoryCacheOptions) -> Result<Self> {
        current_runtime()?;
        let base = CacheBase::new(None, options.default_expiry.as_ref())?;
        let store = Arc::new(RwLock::new(ExpiringStore::new()));
        let sweeper = spawn_sweep_task(Arc::downgrade(&store), options.sweep);

        Ok(Self {
            base,
            store,
            sweeper,
        })
    }

    /// Adds `value` with an explicit expiry instead of the default.
    pub async fn add_with_expiry(&self, value: V, ttl: Option<Expiry>) -> Result<bool> {
        let identity = serde_json::to_string(&value)?;
        let expires_in = self.base.resolve_expiry(ttl.as_ref())?;
        self.store
            .write()
            .await
            .insert(identity, CacheEntry::new(value, expires_in));
        Ok(true)
    }

    /// All live members.
    pub async fn values(&self) -> Vec<V> {
        self.store
            .read()
            .await
            .live_entries()
            .map(|(_, value)| value.clone())
            .collect()
    }

    /// Physical member count, including expired members not yet swept.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub fn close(&self) {
        self.sweeper.abort();
    }
}

#[async_trait]
impl<V> SetCache<V> for MemorySetCache<V>
where
    V: Serialize + Clone + Send + Sync + 'static,
{
    async fn add(&self, value: V) -> Result<bool> {
        self.add_with_expiry(value, None).await
    }

    async fn has(&self, value: &V) -> Result<bool> {
        let identity = serde_json::to_string(value)?;
        Ok(self.store.write().await.contains(&identity))
    }

    async fn delete(&self, value: &V) -> Result<bool> {
        let identity = serde_json::to_string(value)?;
        Ok(self.store.write().await.remove(&identity))
    }

    async fn clear(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

impl<V> Drop for MemorySetCache<V> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}
