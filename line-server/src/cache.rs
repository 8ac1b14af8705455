//! Generic in-memory cache tier.
//!
//! A thin layer over a moka future cache with per-entry TTL support and
//! bounded capacity (LRU discard when full). Holds no domain logic; the
//! schedule and status resolvers each own an instance. Expiry is lazy:
//! an entry past its TTL is simply treated as absent.

use std::hash::Hash;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache as MokaCache;

/// Configuration for a memory cache tier.
#[derive(Debug, Clone)]
pub struct MemoryCacheConfig {
    /// Default TTL for entries inserted without an explicit one.
    pub ttl: Duration,

    /// Maximum number of entries; least-recently-used discard when full.
    pub max_capacity: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 2000,
        }
    }
}

impl MemoryCacheConfig {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self { ttl, max_capacity }
    }
}

/// Cache statistics for the admin surface.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemoryCacheStats {
    pub size: u64,
    pub max_size: u64,
    pub ttl_seconds: u64,
}

/// Stored entry carrying its own TTL override.
#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: Option<Duration>,
}

/// Expiry policy: per-entry TTL when set, default TTL otherwise.
struct EntryTtl {
    default_ttl: Duration,
}

impl<K, V> Expiry<K, Entry<V>> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &K,
        value: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl.unwrap_or(self.default_ttl))
    }
}

/// A TTL-bounded in-memory cache.
pub struct MemoryCache<K, V> {
    inner: MokaCache<K, Entry<V>>,
    config: MemoryCacheConfig,
}

impl<K, V> MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache with the given configuration.
    pub fn new(config: MemoryCacheConfig) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryTtl {
                default_ttl: config.ttl,
            })
            .build();

        Self { inner, config }
    }

    /// Look up a value. Expired entries read as absent.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await.map(|e| e.value)
    }

    /// Insert with the default TTL.
    pub async fn insert(&self, key: K, value: V) {
        self.inner.insert(key, Entry { value, ttl: None }).await;
    }

    /// Insert with an explicit TTL override.
    pub async fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.inner
            .insert(
                key,
                Entry {
                    value,
                    ttl: Some(ttl),
                },
            )
            .await;
    }

    /// Get the cached value for a key, or compute and insert it.
    ///
    /// Concurrent callers for the same key coalesce onto a single
    /// execution of `init`; the others wait for its result. This is the
    /// single-flight guarantee the schedule resolver relies on.
    pub async fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        F: Future<Output = (V, Option<Duration>)>,
        K: Clone,
    {
        let entry = self
            .inner
            .entry(key)
            .or_insert_with(async {
                let (value, ttl) = init.await;
                Entry { value, ttl }
            })
            .await;
        entry.into_value().value
    }

    /// Remove exactly one entry. No-op when the key is absent.
    pub async fn remove(&self, key: &K) {
        self.inner.invalidate(key).await;
    }

    /// Wipe the whole tier.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Current statistics. Flushes pending maintenance so the size is
    /// accurate rather than approximate.
    pub async fn stats(&self) -> MemoryCacheStats {
        self.inner.run_pending_tasks().await;
        MemoryCacheStats {
            size: self.inner.entry_count(),
            max_size: self.config.max_capacity,
            ttl_seconds: self.config.ttl.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn insert_and_get() {
        let cache: MemoryCache<String, u32> = MemoryCache::new(MemoryCacheConfig::default());
        cache.insert("a".to_string(), 1).await;

        assert_eq!(cache.get(&"a".to_string()).await, Some(1));
        assert_eq!(cache.get(&"b".to_string()).await, None);
    }

    #[tokio::test]
    async fn per_entry_ttl_expires_before_default() {
        let config = MemoryCacheConfig::new(Duration::from_secs(600), 100);
        let cache: MemoryCache<&'static str, u32> = MemoryCache::new(config);

        cache
            .insert_with_ttl("short", 1, Duration::from_millis(20))
            .await;
        cache.insert("long", 2).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.get(&"short").await, None);
        assert_eq!(cache.get(&"long").await, Some(2));
    }

    #[tokio::test]
    async fn remove_is_noop_on_missing_key() {
        let cache: MemoryCache<String, u32> = MemoryCache::new(MemoryCacheConfig::default());
        cache.remove(&"missing".to_string()).await;

        cache.insert("a".to_string(), 1).await;
        cache.remove(&"a".to_string()).await;
        assert_eq!(cache.get(&"a".to_string()).await, None);
    }

    #[tokio::test]
    async fn clear_wipes_everything() {
        let cache: MemoryCache<u32, u32> = MemoryCache::new(MemoryCacheConfig::default());
        cache.insert(1, 1).await;
        cache.insert(2, 2).await;
        cache.clear();

        assert_eq!(cache.stats().await.size, 0);
    }

    #[tokio::test]
    async fn stats_reports_config() {
        let config = MemoryCacheConfig::new(Duration::from_secs(300), 500);
        let cache: MemoryCache<u32, u32> = MemoryCache::new(config);
        cache.insert(1, 1).await;

        let stats = cache.stats().await;
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 500);
        assert_eq!(stats.ttl_seconds, 300);
    }

    #[tokio::test]
    async fn get_or_insert_with_coalesces() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cache: Arc<MemoryCache<u32, u32>> =
            Arc::new(MemoryCache::new(MemoryCacheConfig::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_insert_with(7, async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        (42u32, None)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
