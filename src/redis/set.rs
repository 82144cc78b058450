//! Redis-backed set cache.

use std::marker::PhantomData;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::backend::RedisBackend;
use super::connection::RedisTarget;
use crate::cache::SetCache;
use crate::error::Result;

// == Redis Set Cache ==
/// Set of unique values stored as one Redis set named after the namespace.
///
/// Members are JSON encoded, so equal values map to the same member.
pub struct RedisSetCache<V, B = ConnectionManager> {
    namespace: String,
    backend: B,
    _marker: PhantomData<fn() -> V>,
}

impl<V> RedisSetCache<V, ConnectionManager> {
    pub async fn connect(target: impl Into<RedisTarget>, namespace: impl Into<String>) -> Result<Self> {
        let connection = target.into().connect().await?;
        Ok(Self::with_backend(connection, namespace))
    }
}

impl<V, B: RedisBackend> RedisSetCache<V, B> {
    pub fn with_backend(backend: B, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            backend,
            _marker: PhantomData,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl<V, B> RedisSetCache<V, B>
where
    V: DeserializeOwned,
    B: RedisBackend,
{
    /// All members currently in the set.
    pub async fn values(&self) -> Result<Vec<V>> {
        self.backend
            .smembers(&self.namespace)
            .await?
            .iter()
            .map(|raw| serde_json::from_str(raw).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl<V, B> SetCache<V> for RedisSetCache<V, B>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    B: RedisBackend,
{
    async fn add(&self, value: V) -> Result<bool> {
        let member = serde_json::to_string(&value)?;
        self.backend.sadd(&self.namespace, &member).await?;
        Ok(true)
    }

    async fn has(&self, value: &V) -> Result<bool> {
        let member = serde_json::to_string(value)?;
        self.backend.sismember(&self.namespace, &member).await
    }

    async fn delete(&self, value: &V) -> Result<bool> {
        let member = serde_json::to_string(value)?;
        self.backend.srem(&self.namespace, &member).await
    }

    async fn clear(&self) -> Result<()> {
        self.backend.del(&[self.namespace.clone()]).await?;
        Ok(())
    }
}
