//! LRU cache for fetched query results.
//!
//! Keys are the content-addressed cache keys assembled while planning
//! (definition, time range, variable values, query index, dependency
//! fingerprint), so a stale entry is simply never read again: once any
//! key ingredient changes, lookups move to a new key.

use queryloom_types::TimeSeriesData;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded LRU cache over cache-key strings.
///
/// Only successful fetches are stored; errors are never cached.
pub struct FetchCache {
    /// Maximum number of entries
    capacity: usize,
    /// Cached results
    cache: RwLock<FetchCacheInner>,
    hits: AtomicU64,
    misses: AtomicU64,
}

struct FetchCacheInner {
    /// Key -> result mapping
    map: HashMap<String, Arc<TimeSeriesData>>,
    /// Access order (most recent at back)
    order: VecDeque<String>,
}

impl FetchCache {
    /// Create a new cache with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cache: RwLock::new(FetchCacheInner {
                map: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a cached result.
    ///
    /// Returns None if not cached. Does not update access order
    /// (would require write lock, prefer simplicity).
    pub fn get(&self, key: &str) -> Option<Arc<TimeSeriesData>> {
        let cache = self.cache.read().unwrap();
        let hit = cache.map.get(key).cloned();
        match hit {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        hit
    }

    /// Check if a key is cached.
    pub fn contains(&self, key: &str) -> bool {
        let cache = self.cache.read().unwrap();
        cache.map.contains_key(key)
    }

    /// Store a result in the cache.
    pub fn put(&self, key: String, data: Arc<TimeSeriesData>) {
        let mut cache = self.cache.write().unwrap();

        // Remove old entry if exists
        if cache.map.contains_key(&key) {
            cache.order.retain(|k| k != &key);
        }

        // Evict if at capacity
        while cache.order.len() >= self.capacity {
            if let Some(old_key) = cache.order.pop_front() {
                cache.map.remove(&old_key);
            }
        }

        cache.map.insert(key.clone(), data);
        cache.order.push_back(key);
    }

    /// Clear the cache.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap();
        cache.map.clear();
        cache.order.clear();
    }

    /// Current number of cached results.
    pub fn len(&self) -> usize {
        let cache = self.cache.read().unwrap();
        cache.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.read().unwrap();
        CacheStats {
            size: cache.map.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,
    /// Maximum capacity
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Cache utilization percentage.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            (self.size as f64 / self.capacity as f64) * 100.0
        }
    }

    /// Hit ratio over all lookups so far.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
