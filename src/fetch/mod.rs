//! Fetch Module
//!
//! Request coalescing and the cache-fronted fetcher built on it.

mod fetcher;
mod pending;

pub use fetcher::CachedFetcher;
pub use pending::{Flight, PendingRequests};
