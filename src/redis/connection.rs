//! Resolution of the various ways a caller can hand us a Redis engine.

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::debug;

use crate::error::Result;

// == Redis Target ==
/// Where the networked caches get their connection from.
///
/// Resolved exactly once, at construction, into a [`ConnectionManager`].
pub enum RedisTarget {
    /// Connection URL such as `redis://127.0.0.1:6379/0`
    Url(String),
    /// An already configured client
    Client(Client),
    /// An existing managed connection, shared as-is
    Connection(ConnectionManager),
}

impl RedisTarget {
    /// Opens (or reuses) the connection this target describes.
    pub async fn connect(self) -> Result<ConnectionManager> {
        match self {
            RedisTarget::Url(url) => {
                debug!("Connecting to Redis at {}", url);
                let client = Client::open(url.as_str())?;
                Ok(client.get_connection_manager().await?)
            }
            RedisTarget::Client(client) => Ok(client.get_connection_manager().await?),
            RedisTarget::Connection(connection) => Ok(connection),
        }
    }
}

impl From<&str> for RedisTarget {
    fn from(url: &str) -> Self {
        RedisTarget::Url(url.to_string())
    }
}

impl From<String> for RedisTarget {
    fn from(url: String) -> Self {
        RedisTarget::Url(url)
    }
}

impl From<Client> for RedisTarget {
    fn from(client: Client) -> Self {
        RedisTarget::Client(client)
    }
}

impl From<ConnectionManager> for RedisTarget {
    fn from(connection: ConnectionManager) -> Self {
        RedisTarget::Connection(connection)
    }
}
