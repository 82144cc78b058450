//! Redis Module
//!
//! Map and set caches stored in Redis. Expiry uses Redis's native per-key
//! TTL; the map can optionally track its keys for enumeration and clearing.

mod backend;
mod connection;
mod map;
mod set;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{RedisBackend, SetCommand, SetMode};
pub use connection::RedisTarget;
pub use map::RedisMapCache;
pub use set::RedisSetCache;
