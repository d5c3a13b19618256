//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries, so
//! entries nobody reads again do not hold capacity until evicted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::TtlCache;

/// Spawns a background task that periodically purges expired entries.
///
/// The task loops forever, sleeping `interval` between sweeps and taking the
/// cache lock only for the purge itself. Abort the returned handle to stop it.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Mutex::new(TtlCache::<String>::new(100, 60_000)?));
/// let sweeper = spawn_sweep_task(cache.clone(), Duration::from_secs(5));
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweep_task<V>(cache: Arc<Mutex<TtlCache<V>>>, interval: Duration) -> JoinHandle<()>
where
    V: Send + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting expiry sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.lock().await.purge_expired();

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
