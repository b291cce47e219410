//! Bounded in-memory TTL cache backed by `DashMap` for concurrent access.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now" for expiry checks. Tests swap in a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A single cached value with its expiration time.
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe in-memory cache with time-to-live expiration and a size bound.
///
/// Expired entries are lazily evicted on the next `get` call for that key.
/// When the cache is full, `set` first purges every expired entry and then,
/// if still full, drops the entry closest to expiry.
pub struct MemoryCache<V> {
    store: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> MemoryCache<V> {
    /// Creates a new cache on the system clock.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
            clock,
        }
    }

    /// Returns the cached value for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entry = self.store.get(key)?;
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
        }
        self.drop_if_expired(key, now);
        None
    }

    /// Removes `key` only if the entry stored under it has expired as of `now`.
    /// A concurrent `set` between the read and the removal survives.
    fn drop_if_expired(&self, key: &str, now: Instant) {
        self.store.remove_if(key, |_, e| now >= e.expires_at);
    }

    /// Inserts or overwrites a cache entry. The entry expires after the configured TTL.
    pub fn set(&self, key: String, value: V) {
        if !self.store.contains_key(&key) && self.store.len() >= self.capacity {
            self.purge_expired();
            if self.store.len() >= self.capacity {
                self.evict_soonest();
            }
        }
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: self.clock.now() + self.ttl,
            },
        );
    }

    /// Drops every entry whose TTL has elapsed.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.store.retain(|_, e| now < e.expires_at);
    }

    fn evict_soonest(&self) {
        let victim = self
            .store
            .iter()
            .min_by_key(|e| e.value().expires_at)
            .map(|e| e.key().clone());
        if let Some(key) = victim {
            self.store.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Removes all entries from the cache.
    pub fn clear(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use super::Clock;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    /// Clock that only moves when told to.
    pub struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut offset = self.offset.lock().unwrap();
            *offset += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap()
        }
    }
}
