//! Error types for the response cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Configuration Error Enum ==
/// Raised when a cache is constructed from invalid settings.
///
/// This is the only failure a cache itself can report. Lookups of missing or
/// expired keys are normal `None` results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Capacity must hold at least one entry
    #[error("Invalid capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// TTL must be a positive number of milliseconds
    #[error("Invalid ttl: {0}ms (must be at least 1ms)")]
    InvalidTtl(u64),

    /// Sweep interval, when set, must be positive
    #[error("Invalid sweep interval: {0}ms (must be at least 1ms)")]
    InvalidSweepInterval(u64),

    /// Environment variable present but not a valid number
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnvValue { var: String, value: String },
}

// == Fetch Error Enum ==
/// Outcome of a fetch that did not produce a value.
///
/// Cloned to every caller attached to the same in-flight fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError<E> {
    /// The fetch ran and returned an error
    #[error("Fetch failed: {0}")]
    Failed(E),

    /// The fetch panicked or its task was torn down before settling
    #[error("Fetch abandoned: {0}")]
    Abandoned(String),
}

impl<E> FetchError<E> {
    /// Returns the inner error when the fetch itself failed.
    pub fn into_failure(self) -> Option<E> {
        match self {
            FetchError::Failed(err) => Some(err),
            FetchError::Abandoned(_) => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache construction.
pub type Result<T> = std::result::Result<T, ConfigurationError>;
