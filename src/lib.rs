//! Rehearsal Cache - bounded TTL response cache for slow external APIs
//!
//! Provides LRU eviction, lazy TTL expiry, hit/miss metrics and request
//! coalescing, for fronting speech synthesis and emotion analysis calls.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod tasks;

pub use cache::{generate_cache_key, CacheMetrics, RequestFingerprint, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{ConfigurationError, FetchError};
pub use fetch::{CachedFetcher, PendingRequests};
pub use tasks::spawn_sweep_task;
