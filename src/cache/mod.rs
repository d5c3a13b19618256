//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and
//! deterministic key derivation.

mod entry;
mod key;
mod lru;
mod metrics;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use key::{generate_cache_key, RequestFingerprint, PREFIX_SEPARATOR};
pub use lru::LruTracker;
pub use metrics::{CacheMetrics, MetricsRecorder};
pub use store::TtlCache;
