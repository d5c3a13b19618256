//! Pending Requests Module
//!
//! Coalesces concurrent computations for the same key into one execution.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use crate::error::FetchError;

type Outcome<V, E> = Option<Result<V, FetchError<E>>>;
type Table<V, E> = Arc<Mutex<HashMap<String, watch::Receiver<Outcome<V, E>>>>>;

// == Pending Requests ==
/// Table of in-flight computations keyed like the cache they populate.
///
/// The first caller for a key starts the computation on the tokio runtime;
/// later callers attach to it. Every attached caller receives a clone of the
/// same outcome. The entry leaves the table once the computation settles,
/// whether it succeeded, failed or panicked.
///
/// The computation runs in its own task, so dropping the caller that started
/// it does not cancel it.
#[derive(Debug)]
pub struct PendingRequests<V, E> {
    table: Table<V, E>,
}

impl<V, E> Default for PendingRequests<V, E> {
    fn default() -> Self {
        Self {
            table: Arc::default(),
        }
    }
}

impl<V, E> PendingRequests<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    // == Attach Or Start ==
    /// Attaches to the in-flight computation for `key`, or starts one with `start`.
    ///
    /// Synchronous on purpose: a caller can hold its own lock across the
    /// "is it cached? is it pending?" decision. `start` is only invoked when
    /// this caller becomes the leader, and must be called from within a tokio
    /// runtime.
    pub fn attach_or_start<F, Fut>(&self, key: &str, start: F) -> Flight<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut table = lock(&self.table);
        if let Some(rx) = table.get(key) {
            debug!(key = %key, "Attached to in-flight request");
            return Flight {
                rx: rx.clone(),
                leader: false,
            };
        }

        // Build the future before registering so a panicking `start` leaves no entry
        let fut = start();
        let (tx, rx) = watch::channel(None);
        table.insert(key.to_string(), rx.clone());
        drop(table);

        let table = Arc::clone(&self.table);
        let key = key.to_string();
        tokio::spawn(async move {
            // Inner task so a panicking computation still settles the entry
            let outcome = match tokio::spawn(fut).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(FetchError::Failed(err)),
                Err(join_err) => Err(FetchError::Abandoned(join_err.to_string())),
            };
            lock(&table).remove(&key);
            tx.send_replace(Some(outcome));
        });

        Flight { rx, leader: true }
    }

    /// Number of keys with a computation in flight.
    pub fn len(&self) -> usize {
        lock(&self.table).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.table).contains_key(key)
    }
}

// The table is never left half-updated, so a poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Flight ==
/// A caller's handle on an in-flight computation.
#[derive(Debug)]
pub struct Flight<V, E> {
    rx: watch::Receiver<Outcome<V, E>>,
    leader: bool,
}

impl<V, E> Flight<V, E>
where
    V: Clone,
    E: Clone,
{
    /// Whether this caller started the computation.
    pub fn is_leader(&self) -> bool {
        self.leader
    }

    /// Waits for the computation to settle and returns a clone of its outcome.
    pub async fn wait(mut self) -> Result<V, FetchError<E>> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(settled) => match &*settled {
                Some(outcome) => outcome.clone(),
                None => Err(FetchError::Abandoned("settled without outcome".to_string())),
            },
            Err(_) => Err(FetchError::Abandoned(
                "computation dropped before settling".to_string(),
            )),
        }
    }
}
