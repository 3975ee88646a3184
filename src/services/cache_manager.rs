use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};

/// Cache key holding the serialized inventory list
pub const INVENTORY_LIST_KEY: &str = "inventories";

#[derive(Debug, Clone)]
struct CachedItem<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CachedItem<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicUsize,
    misses: AtomicUsize,
    invalidations: AtomicUsize,
}

/// In-process key/value cache whose entries expire a fixed TTL after insertion.
///
/// Writers are expected to call [`CacheManager::invalidate`] after every
/// successful mutation of the data a key was built from. Nothing stops a
/// reader from repopulating a key with data read just before the write.
#[derive(Clone)]
pub struct CacheManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    cache: Arc<RwLock<HashMap<K, CachedItem<V>>>>,
    ttl: Duration,
    counters: Arc<Counters>,
}

impl<K, V> CacheManager<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Inserts a value, replacing any previous entry and restarting its TTL
    pub async fn insert(&self, key: K, value: V) {
        let mut cache = self.cache.write().await;
        cache.insert(key, CachedItem::new(value, self.ttl));
    }

    /// Gets a live value, dropping it if it has expired
    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let cache = self.cache.read().await;
            match cache.get(key) {
                Some(item) if !item.is_expired() => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(item.value.clone());
                }
                Some(_) => {}
                None => {
                    self.counters.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Expired: take the write lock and re-check, a writer may have refreshed it
        let mut cache = self.cache.write().await;
        if let Some(item) = cache.get(key) {
            if !item.is_expired() {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Some(item.value.clone());
            }
            cache.remove(key);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Drops a key after the data behind it changed. Returns whether an entry was present.
    pub async fn invalidate(&self, key: &K) -> bool {
        let mut cache = self.cache.write().await;
        self.counters.invalidations.fetch_add(1, Ordering::Relaxed);
        cache.remove(key).is_some()
    }

    /// Removes expired items from the cache
    pub async fn cleanup_expired(&self) -> usize {
        let mut cache = self.cache.write().await;
        let initial_count = cache.len();

        cache.retain(|_, item| !item.is_expired());

        let removed_count = initial_count - cache.len();

        if removed_count > 0 {
            tracing::debug!("Cleaned up {} expired cache items", removed_count);
        }

        removed_count
    }

    pub async fn get_stats(&self) -> CacheStats {
        let cache = self.cache.read().await;

        let total_items = cache.len();
        let expired_items = cache.values().filter(|item| item.is_expired()).count();

        CacheStats {
            total_items,
            active_items: total_items - expired_items,
            expired_items,
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            invalidations: self.counters.invalidations.load(Ordering::Relaxed),
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_items: usize,
    pub active_items: usize,
    pub expired_items: usize,
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
    pub ttl_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> String {
        name.to_string()
    }

    #[tokio::test]
    async fn test_cache_insert_and_get() {
        let cache: CacheManager<String, String> = CacheManager::with_ttl(Duration::from_secs(60));

        cache.insert(key("key1"), "value1".to_string()).await;

        let value = cache.get(&key("key1")).await;
        assert_eq!(value, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_cache_ttl() {
        let cache: CacheManager<String, String> =
            CacheManager::with_ttl(Duration::from_millis(100));

        cache.insert(key("key1"), "value1".to_string()).await;
        assert!(cache.get(&key("key1")).await.is_some());

        // Wait for expiry
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(cache.get(&key("key1")).await, None);
        // The expired read dropped the entry
        assert_eq!(cache.get_stats().await.total_items, 0);
    }

    #[tokio::test]
    async fn test_cache_invalidate() {
        let cache: CacheManager<String, String> = CacheManager::with_ttl(Duration::from_secs(60));

        cache.insert(key(INVENTORY_LIST_KEY), "[]".to_string()).await;

        assert!(cache.invalidate(&key(INVENTORY_LIST_KEY)).await);
        assert_eq!(cache.get(&key(INVENTORY_LIST_KEY)).await, None);

        // Invalidating an absent key is harmless
        assert!(!cache.invalidate(&key(INVENTORY_LIST_KEY)).await);
    }

    #[tokio::test]
    async fn test_cache_cleanup_expired() {
        let cache: CacheManager<String, String> =
            CacheManager::with_ttl(Duration::from_millis(100));

        cache.insert(key("key1"), "value1".to_string()).await;
        cache.insert(key("key2"), "value2".to_string()).await;

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.insert(key("fresh"), "value3".to_string()).await;

        let stats = cache.get_stats().await;
        assert_eq!(stats.expired_items, 2);
        assert_eq!(stats.active_items, 1);

        assert_eq!(cache.cleanup_expired().await, 2);
        assert_eq!(cache.get_stats().await.total_items, 1);
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let cache: CacheManager<String, String> = CacheManager::with_ttl(Duration::from_secs(60));

        cache.insert(key("key1"), "value1".to_string()).await;

        cache.get(&key("key1")).await;
        cache.get(&key("key1")).await;
        cache.get(&key("missing")).await;
        cache.invalidate(&key("key1")).await;

        let stats = cache.get_stats().await;
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(stats.ttl_seconds, 60);
    }
}
