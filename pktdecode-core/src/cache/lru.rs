//! LRU result cache with TTL expiry.
//!
//! Entries live in a hash map; recency is tracked in an ordered map from a
//! monotonically increasing access tick to the key, so the least recently
//! used entry is always the first element. Every operation takes a single
//! `parking_lot::Mutex` and does no I/O while holding it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use super::{CacheEntryInfo, CacheKey, CacheStats};
use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::packet::DecodedPacket;

struct Entry {
    packet: Arc<DecodedPacket>,
    created: Instant,
    last_access: Instant,
    access_count: u64,
    /// Position in the recency order.
    tick: u64,
}

struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    /// tick -> key, oldest first
    order: BTreeMap<u64, CacheKey>,
    next_tick: u64,
    capacity: usize,
    ttl: Duration,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheState {
    fn next_tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn is_expired(&self, entry: &Entry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created) > self.ttl
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.tick);
        Some(entry)
    }

    /// Move an entry to the most recently used position.
    fn touch(&mut self, key: &CacheKey) {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(key) {
            self.order.remove(&entry.tick);
            entry.tick = tick;
            self.order.insert(tick, *key);
        }
    }

    fn evict_lru(&mut self) -> bool {
        let Some((_, key)) = self.order.pop_first() else {
            return false;
        };
        self.entries.remove(&key);
        self.evictions += 1;
        true
    }

    fn evict_to(&mut self, bound: usize) {
        while self.entries.len() > bound {
            if !self.evict_lru() {
                break;
            }
        }
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(_, e)| self.is_expired(e, now))
            .map(|(k, _)| *k)
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

/// Thread-safe memo of decode results keyed by frame content.
pub struct ResultCache {
    state: Mutex<CacheState>,
}

impl ResultCache {
    /// Create a cache; zero capacity or zero TTL is rejected.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::with_capacity(config.capacity.min(10_000)),
                order: BTreeMap::new(),
                next_tick: 0,
                capacity: config.capacity,
                ttl: config.ttl,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    /// Look up the decode result for these raw bytes.
    pub fn get(&self, raw: &[u8]) -> Option<Arc<DecodedPacket>> {
        self.get_key(&CacheKey::for_bytes(raw))
    }

    /// Look up by precomputed key.
    pub fn get_key(&self, key: &CacheKey) -> Option<Arc<DecodedPacket>> {
        self.get_key_at(key, Instant::now())
    }

    fn get_key_at(&self, key: &CacheKey, now: Instant) -> Option<Arc<DecodedPacket>> {
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => state.is_expired(entry, now),
        };

        if expired {
            state.remove(key);
            state.misses += 1;
            return None;
        }

        state.hits += 1;
        state.touch(key);
        let entry = state.entries.get_mut(key)?;
        entry.access_count += 1;
        entry.last_access = now;
        Some(Arc::clone(&entry.packet))
    }

    /// Store the decode result for these raw bytes.
    pub fn put(&self, raw: &[u8], packet: Arc<DecodedPacket>) {
        self.put_key(CacheKey::for_bytes(raw), packet);
    }

    /// Store by precomputed key.
    pub fn put_key(&self, key: CacheKey, packet: Arc<DecodedPacket>) {
        self.put_key_at(key, packet, Instant::now());
    }

    fn put_key_at(&self, key: CacheKey, packet: Arc<DecodedPacket>, now: Instant) {
        let mut state = self.state.lock();

        // Existing key: refresh in place
        if let Some(entry) = state.entries.get_mut(&key) {
            entry.packet = packet;
            entry.created = now;
            entry.last_access = now;
            state.touch(&key);
            return;
        }

        state.purge_expired(now);
        while state.entries.len() >= state.capacity {
            if !state.evict_lru() {
                break;
            }
        }

        let tick = state.next_tick();
        state.order.insert(tick, key);
        state.entries.insert(
            key,
            Entry {
                packet,
                created: now,
                last_access: now,
                access_count: 0,
                tick,
            },
        );
    }

    /// Remove one entry. Returns true if it was present.
    pub fn invalidate(&self, raw: &[u8]) -> bool {
        self.state.lock().remove(&CacheKey::for_bytes(raw)).is_some()
    }

    /// Remove all entries and reset the counters.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
        state.hits = 0;
        state.misses = 0;
        state.evictions = 0;
    }

    /// Change the capacity, evicting least recently used entries down to it.
    pub fn resize(&self, capacity: usize) -> Result<(), ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity { component: "cache" });
        }
        let mut state = self.state.lock();
        state.capacity = capacity;
        state.evict_to(capacity);
        debug!(capacity, size = state.entries.len(), "cache resized");
        Ok(())
    }

    /// Change the TTL and immediately drop entries older than it.
    pub fn set_ttl(&self, ttl: Duration) -> Result<(), ConfigError> {
        if ttl.is_zero() {
            return Err(ConfigError::Invalid {
                field: "cache.ttl",
                reason: "must be greater than zero".to_string(),
            });
        }
        let mut state = self.state.lock();
        state.ttl = ttl;
        let purged = state.purge_expired(Instant::now());
        debug!(ttl_secs = ttl.as_secs_f64(), purged, "cache TTL changed");
        Ok(())
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.state.lock().purge_expired(Instant::now())
    }

    /// Snapshot of all entries, least recently used first.
    pub fn entries(&self) -> Vec<CacheEntryInfo> {
        let now = Instant::now();
        let state = self.state.lock();
        state
            .order
            .values()
            .filter_map(|key| {
                let entry = state.entries.get(key)?;
                Some(CacheEntryInfo {
                    key: key.short_hex(),
                    age: now.saturating_duration_since(entry.created),
                    idle: now.saturating_duration_since(entry.last_access),
                    access_count: entry.access_count,
                    expired: state.is_expired(entry, now),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    pub fn ttl(&self) -> Duration {
        self.state.lock().ttl
    }

    /// Get current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            max_size: state.capacity,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            ttl: state.ttl,
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::from_valid(CacheConfig::default())
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("ResultCache")
            .field("max_size", &stats.max_size)
            .field("size", &stats.size)
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .field("hit_rate", &format!("{:.2}%", stats.hit_rate() * 100.0))
            .finish()
    }
}
