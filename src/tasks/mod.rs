//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Expiry sweep: proactively purges expired entries at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
