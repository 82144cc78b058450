//! Disk Module
//!
//! Map cache persisted in SQLite, with TTL emulated through row timestamps
//! and a periodic age sweep.

mod map;
mod store;

pub use map::DiskMapCache;
pub(crate) use store::DiskStore;
pub use store::DiskTarget;
