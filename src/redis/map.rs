//! Redis-backed map cache.

use std::marker::PhantomData;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::backend::{RedisBackend, SetCommand, SetMode};
use super::connection::RedisTarget;
use crate::cache::{CacheBase, Entries, MapCache};
use crate::config::RedisCacheOptions;
use crate::duration::Expiry;
use crate::error::{CacheError, Result};

/// Prefix of the set that tracks a namespace's keys.
///
/// Kept distinct from the namespace itself so clearing a cache can never
/// delete an unrelated key that happens to be named after the namespace.
const TRACKING_PREFIX: &str = "kas:members:";

// == Redis Map Cache ==
/// Key/value cache stored in Redis under `"{namespace}:{key}"`.
///
/// Expiry is Redis's own `PX`; nothing is tracked locally. With
/// `track_keys` enabled each write also records the key in a membership set,
/// which makes `keys`, `values`, `entries` and `clear` available. That set is
/// only as accurate as its writers: keys expired by Redis stay listed until
/// deleted through the cache.
pub struct RedisMapCache<V, B = ConnectionManager> {
    base: CacheBase,
    backend: B,
    track_keys: bool,
    _marker: PhantomData<fn() -> V>,
}

impl<V> RedisMapCache<V, ConnectionManager> {
    /// Connects to `target` and creates a cache for `namespace`.
    pub async fn connect(
        target: impl Into<RedisTarget>,
        namespace: impl Into<String>,
        options: RedisCacheOptions,
    ) -> Result<Self> {
        let connection = target.into().connect().await?;
        Self::with_backend(connection, namespace, options)
    }
}

impl<V, B: RedisBackend> RedisMapCache<V, B> {
    /// Creates a cache over an already resolved backend.
    pub fn with_backend(backend: B, namespace: impl Into<String>, options: RedisCacheOptions) -> Result<Self> {
        let base = CacheBase::new(Some(namespace.into()), options.default_expiry.as_ref())?;
        Ok(Self {
            base,
            backend,
            track_keys: options.track_keys,
            _marker: PhantomData,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Key of the membership set, or `Unsupported` when tracking is off.
    pub fn tracking_key(&self) -> Result<String> {
        if !self.track_keys {
            return Err(CacheError::Unsupported(
                "the track_keys option is required to enumerate or clear a Redis map cache".to_string(),
            ));
        }

        Ok(format!("{}{}", TRACKING_PREFIX, self.base.namespace().unwrap_or_default()))
    }

    /// Keys recorded in the membership set.
    ///
    /// May include keys Redis has already expired.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let tracking_key = self.tracking_key()?;
        self.backend.smembers(&tracking_key).await
    }
}

impl<V, B> RedisMapCache<V, B>
where
    V: Serialize + DeserializeOwned,
    B: RedisBackend,
{
    // == Set With Mode ==
    /// Writes `value`, forwarding `mode` to Redis unchanged.
    ///
    /// With [`SetMode::KeepTtl`] the key keeps whatever expiry it has, so
    /// both `ttl` and the cache default are ignored. Returns false when the
    /// mode condition made Redis skip the write.
    pub async fn set_with_mode(
        &self,
        key: &str,
        value: V,
        ttl: Option<Expiry>,
        mode: Option<SetMode>,
    ) -> Result<bool> {
        // Redis rejects PX together with KEEPTTL.
        let expiry_ms = match mode {
            Some(SetMode::KeepTtl) => None,
            _ => self.base.resolve_expiry(ttl.as_ref())?,
        };
        let command = SetCommand {
            key: self.base.prefixed_key(key),
            value: serde_json::to_string(&value)?,
            expiry_ms,
            mode,
        };

        if self.track_keys {
            let tracking_key = self.tracking_key()?;
            self.backend.tracked_set(&tracking_key, key, command).await
        } else {
            self.backend.set(command).await
        }
    }

    /// Values of every tracked key that still resolves.
    pub async fn values(&self) -> Result<Vec<V>> {
        Ok(self.entries().await?.map(|(_, value)| value).collect())
    }

    /// Snapshot of tracked keys with their current values.
    ///
    /// Keys that expired or were deleted between enumeration and fetch are
    /// skipped.
    pub async fn entries(&self) -> Result<Entries<V>> {
        let keys = self.keys().await?;
        let prefixed: Vec<String> = keys.iter().map(|key| self.base.prefixed_key(key)).collect();
        let values = self.backend.mget(&prefixed).await?;

        let mut pairs = Vec::with_capacity(keys.len());
        for (key, raw) in keys.into_iter().zip(values) {
            if let Some(raw) = raw {
                pairs.push((key, serde_json::from_str(&raw)?));
            }
        }

        Ok(Entries::new(pairs))
    }
}

#[async_trait]
impl<V, B> MapCache<V> for RedisMapCache<V, B>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: RedisBackend,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        let prefixed = self.base.prefixed_key(key);
        match self.backend.get(&prefixed).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: V, ttl: Option<Expiry>) -> Result<bool> {
        self.set_with_mode(key, value, ttl, None).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        self.backend.exists(&self.base.prefixed_key(key)).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let prefixed = self.base.prefixed_key(key);
        let removed = if self.track_keys {
            let tracking_key = self.tracking_key()?;
            self.backend.tracked_del(&tracking_key, key, &prefixed).await?
        } else {
            self.backend.del(&[prefixed]).await?
        };

        Ok(removed > 0)
    }

    async fn clear(&self) -> Result<()> {
        let tracking_key = self.tracking_key()?;
        let members = self.backend.smembers(&tracking_key).await?;
        let count = members.len();

        let mut keys: Vec<String> = members.iter().map(|key| self.base.prefixed_key(key)).collect();
        keys.push(tracking_key);
        self.backend.del(&keys).await?;

        debug!(
            "Cleared {} tracked keys from namespace {}",
            count,
            self.base.namespace().unwrap_or_default()
        );
        Ok(())
    }
}
