//! Redis Backend
//!
//! The narrow set of Redis commands the caches need, behind a trait so the
//! engine handle can be swapped (a pooled connection, a cluster client, or a
//! stand-in during tests).

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Cmd;

use crate::error::Result;

// == Set Mode ==
/// Condition flag forwarded verbatim to `SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// `KEEPTTL`: keep the key's existing expiry
    KeepTtl,
    /// `NX`: only write if the key does not exist
    OnlyIfUnset,
    /// `XX`: only write if the key already exists
    OnlyIfSet,
}

impl SetMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetMode::KeepTtl => "KEEPTTL",
            SetMode::OnlyIfUnset => "NX",
            SetMode::OnlyIfSet => "XX",
        }
    }
}

// == Set Command ==
/// A fully resolved `SET key value [PX ms] [mode]` write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCommand {
    pub key: String,
    pub value: String,
    /// Expiry in milliseconds, sent as `PX`
    pub expiry_ms: Option<u64>,
    pub mode: Option<SetMode>,
}

impl SetCommand {
    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = redis::cmd("SET");
        cmd.arg(&self.key).arg(&self.value);
        if let Some(ms) = self.expiry_ms {
            // PX = millisecond precision
            cmd.arg("PX").arg(ms);
        }
        if let Some(mode) = self.mode {
            cmd.arg(mode.as_str());
        }
        cmd
    }
}

// == Redis Backend ==
/// Redis commands used by the networked caches.
///
/// Errors are returned untouched; nothing here retries.
#[async_trait]
pub trait RedisBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// `MGET`; the result is aligned with `keys`.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Runs a `SET`, returning false when a mode condition skipped the write.
    async fn set(&self, command: SetCommand) -> Result<bool>;

    /// `DEL`, returning how many keys were removed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    async fn sadd(&self, key: &str, member: &str) -> Result<bool>;

    async fn srem(&self, key: &str, member: &str) -> Result<bool>;

    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// `SADD tracking_key member` and the `SET` in one atomic round trip.
    async fn tracked_set(&self, tracking_key: &str, member: &str, command: SetCommand) -> Result<bool>;

    /// `SREM tracking_key member` and `DEL key` in one atomic round trip.
    async fn tracked_del(&self, tracking_key: &str, member: &str, key: &str) -> Result<u64>;
}

#[async_trait]
impl RedisBackend for ConnectionManager {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.clone();
        let exists: bool = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(exists)
    }

    async fn set(&self, command: SetCommand) -> Result<bool> {
        let mut conn = self.clone();
        let reply: Option<String> = command.to_cmd().query_async(&mut conn).await?;
        Ok(reply.is_some())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.clone();
        let removed: u64 = redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        Ok(removed)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.clone();
        let added: u64 = redis::cmd("SADD").arg(key).arg(member).query_async(&mut conn).await?;
        Ok(added > 0)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.clone();
        let removed: u64 = redis::cmd("SREM").arg(key).arg(member).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.clone();
        let found: bool = redis::cmd("SISMEMBER").arg(key).arg(member).query_async(&mut conn).await?;
        Ok(found)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.clone();
        let members: Vec<String> = redis::cmd("SMEMBERS").arg(key).query_async(&mut conn).await?;
        Ok(members)
    }

    async fn tracked_set(&self, tracking_key: &str, member: &str, command: SetCommand) -> Result<bool> {
        let mut conn = self.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SADD")
            .arg(tracking_key)
            .arg(member)
            .ignore()
            .add_command(command.to_cmd());

        let (reply,): (Option<String>,) = pipe.query_async(&mut conn).await?;
        Ok(reply.is_some())
    }

    async fn tracked_del(&self, tracking_key: &str, member: &str, key: &str) -> Result<u64> {
        let mut conn = self.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SREM")
            .arg(tracking_key)
            .arg(member)
            .ignore()
            .cmd("DEL")
            .arg(key);

        let (removed,): (u64,) = pipe.query_async(&mut conn).await?;
        Ok(removed)
    }
}
