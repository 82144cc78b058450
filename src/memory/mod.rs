//! Memory Module
//!
//! Process-local caches with lazy expiry and a background sampling sweep.

mod map;
mod set;

pub use map::MemoryMapCache;
pub use set::MemorySetCache;
