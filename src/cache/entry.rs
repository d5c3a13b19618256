//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with access metadata.

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Timestamps are Unix milliseconds read from the owning cache's clock.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion (or last overwrite) timestamp
    pub created_at: u64,
    /// Timestamp of the most recent hit
    pub last_accessed_at: u64,
    /// Number of hits served from this key
    pub use_count: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry stamped at `now`.
    pub fn new(value: V, now: u64) -> Self {
        Self {
            value,
            created_at: now,
            last_accessed_at: now,
            use_count: 0,
        }
    }

    // == Replace ==
    /// Overwrites the value and restarts the TTL window.
    ///
    /// `use_count` is kept: it measures how popular the key is, not the value.
    pub fn replace(&mut self, value: V, now: u64) {
        self.value = value;
        self.created_at = now;
        self.last_accessed_at = now;
    }

    // == Touch ==
    /// Records a hit at `now`.
    pub fn touch(&mut self, now: u64) {
        self.last_accessed_at = now;
        self.use_count += 1;
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: the entry is expired once `now - created_at >= ttl`,
    /// so it is still visible at `created_at + ttl - 1`. A clock that moved
    /// backwards counts as zero elapsed time.
    pub fn is_expired(&self, now: u64, ttl_ms: u64) -> bool {
        self.age_ms(now) >= ttl_ms
    }

    /// Milliseconds since the entry was written.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.created_at)
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now: u64, ttl_ms: u64) -> u64 {
        ttl_ms.saturating_sub(self.age_ms(now))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("clip-001.mp3", 500);

        assert_eq!(entry.value, "clip-001.mp3");
        assert_eq!(entry.created_at, 500);
        assert_eq!(entry.last_accessed_at, 500);
        assert_eq!(entry.use_count, 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new((), 1_000);

        assert!(!entry.is_expired(1_000, 100));
        assert!(!entry.is_expired(1_099, 100));
        assert!(entry.is_expired(1_100, 100), "Entry should be expired at boundary");
        assert!(entry.is_expired(5_000, 100));
    }

    #[test]
    fn test_clock_moving_backwards_is_not_expired() {
        let entry = CacheEntry::new((), 1_000);
        assert!(!entry.is_expired(10, 100));
        assert_eq!(entry.ttl_remaining_ms(10, 100), 100);
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new((), 0);

        assert_eq!(entry.ttl_remaining_ms(0, 1_000), 1_000);
        assert_eq!(entry.ttl_remaining_ms(400, 1_000), 600);
        assert_eq!(entry.ttl_remaining_ms(1_000, 1_000), 0);
        assert_eq!(entry.ttl_remaining_ms(9_000, 1_000), 0);
    }

    #[test]
    fn test_touch_counts_uses() {
        let mut entry = CacheEntry::new("v", 0);
        entry.touch(10);
        entry.touch(20);

        assert_eq!(entry.use_count, 2);
        assert_eq!(entry.last_accessed_at, 20);
        assert_eq!(entry.created_at, 0, "touch must not extend the TTL");
    }

    #[test]
    fn test_replace_preserves_use_count() {
        let mut entry = CacheEntry::new("old", 0);
        entry.touch(5);
        entry.touch(6);

        entry.replace("new", 50);

        assert_eq!(entry.value, "new");
        assert_eq!(entry.created_at, 50);
        assert_eq!(entry.last_accessed_at, 50);
        assert_eq!(entry.use_count, 2);
    }
}
