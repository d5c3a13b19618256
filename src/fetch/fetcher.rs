//! Cached Fetcher Module
//!
//! Puts a bounded TTL cache and a pending-request table in front of a slow
//! computation, so each key is fetched at most once per miss window.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{CacheMetrics, MetricsRecorder, TtlCache};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{FetchError, Result};
use crate::fetch::PendingRequests;
use crate::tasks::spawn_sweep_task;

// == Cached Fetcher ==
/// Owned cache-plus-coalescing front for one external service.
///
/// Construct one per service wrapper (speech synthesis, emotion analysis...)
/// and hand it out by reference. There is no global instance.
#[derive(Debug)]
pub struct CachedFetcher<V, E> {
    cache: Arc<Mutex<TtlCache<V>>>,
    pending: PendingRequests<V, E>,
    recorder: Arc<MetricsRecorder>,
    config: CacheConfig,
    sweeper: Option<JoinHandle<()>>,
}

impl<V, E> CachedFetcher<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a fetcher on the system clock.
    ///
    /// # Errors
    /// `ConfigurationError` if the config has a zero capacity, TTL or sweep interval.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let cache = TtlCache::with_clock(config, clock)?;
        let recorder = cache.recorder();
        Ok(Self {
            cache: Arc::new(Mutex::new(cache)),
            pending: PendingRequests::new(),
            recorder,
            config: config.clone(),
            sweeper: None,
        })
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or runs `fetch` to produce it.
    ///
    /// Concurrent callers that miss on the same key share a single `fetch`
    /// execution and all receive its outcome. Successful values are cached
    /// before the in-flight entry is released, so a caller arriving in between
    /// sees either the pending fetch or the cached value. Failures are not
    /// cached.
    ///
    /// `fetch` is invoked while the cache lock is held; it should only build
    /// the future and leave the work to the future itself.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> std::result::Result<V, FetchError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<V, E>> + Send + 'static,
    {
        let flight = {
            let mut cache = self.cache.lock().await;
            if let Some(value) = cache.get(key) {
                return Ok(value);
            }

            let cache_handle = Arc::clone(&self.cache);
            let recorder = Arc::clone(&self.recorder);
            let owned_key = key.to_string();
            self.pending.attach_or_start(key, move || {
                let fut = fetch();
                async move {
                    let started = Instant::now();
                    let result = fut.await;
                    match &result {
                        Ok(value) => {
                            recorder.record_fetch(started.elapsed());
                            cache_handle.lock().await.set(owned_key.as_str(), value.clone());
                            debug!(key = %owned_key, "Cached fetched value");
                        }
                        Err(_) => {
                            recorder.record_fetch_failure();
                            warn!(key = %owned_key, "Fetch failed, nothing cached");
                        }
                    }
                    result
                }
            })
        };

        let leader = flight.is_leader();
        if !leader {
            self.recorder.record_coalesced();
        }

        let outcome = flight.wait().await;
        if leader {
            if let Err(FetchError::Abandoned(reason)) = &outcome {
                self.recorder.record_fetch_failure();
                warn!(key = %key, reason = %reason, "Fetch abandoned");
            }
        }
        outcome
    }

    /// Cache lookup only; never fetches.
    pub async fn get(&self, key: &str) -> Option<V> {
        self.cache.lock().await.get(key)
    }

    /// Stores a value directly, e.g. to prewarm common lines.
    pub async fn set(&self, key: &str, value: V) {
        self.cache.lock().await.set(key, value);
    }

    /// Drops the cached value for `key`. In-flight fetches are unaffected.
    pub async fn invalidate(&self, key: &str) -> bool {
        self.cache.lock().await.delete(key)
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.cache.lock().await.keys()
    }

    /// Number of keys with a fetch in flight.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub async fn metrics(&self) -> CacheMetrics {
        self.cache.lock().await.metrics()
    }

    pub async fn frequent_ratio(&self, threshold: u64) -> f64 {
        self.cache.lock().await.frequent_ratio(threshold)
    }

    // == Lifecycle ==
    /// Starts the background expiry sweeper if the config asks for one.
    ///
    /// Returns whether a sweeper is running afterwards.
    pub fn spawn_sweeper(&mut self) -> bool {
        if self.sweeper.is_some() {
            return true;
        }
        match self.config.sweep_interval() {
            Some(interval) => {
                self.sweeper = Some(spawn_sweep_task(Arc::clone(&self.cache), interval));
                true
            }
            None => false,
        }
    }

    /// Stops background work. Cached values are dropped with the fetcher.
    pub fn dispose(mut self) {
        self.stop_sweeper();
        info!("Cached fetcher disposed");
    }
}

impl<V, E> CachedFetcher<V, E> {
    fn stop_sweeper(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
            debug!("Expiry sweeper aborted");
        }
    }
}

impl<V, E> Drop for CachedFetcher<V, E> {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}
