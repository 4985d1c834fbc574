//! Filesystem helpers: atomic replacement, advisory locks, and the health cache.

pub mod atomic;
pub mod health_cache;
pub mod locking;

pub use atomic::{atomic_write, content_digest};
pub use health_cache::HealthCache;
pub use locking::ExclusiveLock;
