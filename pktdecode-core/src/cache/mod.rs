//! Content-addressed cache of decode results.
//!
//! Identical frames (retransmissions, replayed captures, periodic
//! keep-alives) decode to identical results, so the decoder memoizes
//! them. Entries are keyed by the SHA-256 digest of the raw bytes, expire
//! after a TTL, and are evicted least-recently-used first when the cache
//! is full.

mod lru;

pub use lru::ResultCache;

use std::fmt::Write;
use std::time::Duration;

use ring::digest;

/// SHA-256 digest of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Hash raw frame bytes.
    pub fn for_bytes(data: &[u8]) -> Self {
        let hash = digest::digest(&digest::SHA256, data);
        let mut key = [0u8; 32];
        key.copy_from_slice(hash.as_ref());
        CacheKey(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex of the full digest.
    pub fn to_hex(&self) -> String {
        self.0.iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
    }

    /// First 8 bytes as hex, enough to tell entries apart in listings.
    pub fn short_hex(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(16);
        hex
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Counters reported by [`ResultCache::stats`](crate::cache::ResultCache::stats).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached entries.
    pub size: usize,
    /// Maximum number of entries allowed.
    pub max_size: usize,
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including expired entries).
    pub misses: u64,
    /// Entries pushed out to stay within capacity (expiry not included).
    pub evictions: u64,
    /// Entry lifetime.
    pub ttl: Duration,
}

impl CacheStats {
    /// Calculate the hit rate (hits / total lookups).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Calculate cache utilization (size / max_size).
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.size as f64 / self.max_size as f64
        }
    }

    /// Format statistics as a human-readable string.
    pub fn format_summary(&self) -> String {
        let hit_pct = self.hit_rate() * 100.0;
        let miss_pct = if self.hits + self.misses == 0 {
            0.0
        } else {
            100.0 - hit_pct
        };
        let util_pct = self.utilization() * 100.0;

        format!(
            "Cache Statistics:\n\
             \x20 Hits:        {:>10} ({:.1}%)\n\
             \x20 Misses:      {:>10} ({:.1}%)\n\
             \x20 Entries:     {:>10} / {} ({:.1}%)\n\
             \x20 Evictions:   {:>10}\n\
             \x20 TTL:         {:>9}s",
            self.hits, hit_pct,
            self.misses, miss_pct,
            self.size, self.max_size, util_pct,
            self.evictions,
            self.ttl.as_secs(),
        )
    }
}

/// Snapshot of one cache entry, for inspection.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntryInfo {
    /// Leading hex digits of the key.
    pub key: String,
    pub age: Duration,
    pub idle: Duration,
    pub access_count: u64,
    /// Older than the TTL but not yet purged.
    pub expired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_sha256() {
        // SHA-256("abc")
        let key = CacheKey::for_bytes(b"abc");
        assert_eq!(
            key.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(key.short_hex(), "ba7816bf8f01cfea");
    }

    #[test]
    fn test_key_depends_only_on_content() {
        let a = CacheKey::for_bytes(&[1, 2, 3]);
        let b = CacheKey::for_bytes(&vec![1, 2, 3]);
        assert_eq!(a, b);
        assert_ne!(a, CacheKey::for_bytes(&[1, 2, 4]));
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 75,
            misses: 25,
            size: 100,
            max_size: 1000,
            ..Default::default()
        };

        assert!((stats.hit_rate() - 0.75).abs() < 0.001);
        assert!((stats.utilization() - 0.1).abs() < 0.001);
    }

    #[test]
    fn test_cache_stats_empty() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        assert!(stats.format_summary().contains("Hits:"));
    }
}
