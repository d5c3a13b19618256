//! Cache Metrics Module
//!
//! Tracks cache performance counters and builds point-in-time snapshots.
//!
//! Counters are plain atomics updated after the cache mutation they describe,
//! so recording can neither block the hot path nor leave the cache half-updated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Metrics Recorder ==
/// Lifetime counters for one cache and the fetches made on its behalf.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    fetch_latency_total_us: AtomicU64,
    coalesced: AtomicU64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// An entry removed to make room under the capacity bound.
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// An entry removed because its TTL elapsed.
    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    /// A completed fallback fetch and how long it took.
    pub fn record_fetch(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.fetch_latency_total_us
            .fetch_add(micros, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A caller that attached to an in-flight fetch instead of starting one.
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Zeroes every counter. Only for owners that want a full reset.
    pub fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.expirations,
            &self.fetches,
            &self.fetch_failures,
            &self.fetch_latency_total_us,
            &self.coalesced,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    // == Snapshot ==
    /// Combines the counters with the cache's current shape.
    pub fn snapshot(
        &self,
        size: usize,
        capacity: usize,
        keys: Vec<String>,
        captured_at_ms: u64,
    ) -> CacheMetrics {
        let fetches = self.fetches.load(Ordering::Relaxed);
        let latency_total_us = self.fetch_latency_total_us.load(Ordering::Relaxed);
        let avg_fetch_latency_ms = if fetches == 0 {
            0.0
        } else {
            latency_total_us as f64 / fetches as f64 / 1000.0
        };

        CacheMetrics {
            hits: self.hits(),
            misses: self.misses(),
            evictions: self.evictions(),
            expirations: self.expirations.load(Ordering::Relaxed),
            size,
            capacity,
            keys,
            fetches,
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            avg_fetch_latency_ms,
            captured_at: i64::try_from(captured_at_ms)
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .unwrap_or_default(),
        }
    }
}

// == Cache Metrics ==
/// Point-in-time view of a cache, serialized in camelCase for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetrics {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing live (absent or expired)
    pub misses: u64,
    /// Entries dropped to respect capacity
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    /// Physically present entries
    pub size: usize,
    pub capacity: usize,
    /// Present keys, least recently used first
    pub keys: Vec<String>,
    /// Completed fallback fetches
    pub fetches: u64,
    pub fetch_failures: u64,
    /// Callers served by another caller's in-flight fetch
    pub coalesced: u64,
    pub avg_fetch_latency_ms: f64,
    pub captured_at: DateTime<Utc>,
}

impl CacheMetrics {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
