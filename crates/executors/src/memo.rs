use lru::LruCache;
use parking_lot::RwLock;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// A bounded, TTL-evicting memoization cache.
///
/// Used to memoize token metadata (`decimals`/`symbol`) and resolved
/// prices within a request's lifetime. A
/// `None` `ttl` means entries never expire on their own, only by LRU
/// eviction once `capacity` is exceeded.
///
/// Grounded on the `Arc<RwLock<_>> + lru::LruCache` shape of
/// `init4tech-signet-sdk/crates/sim/src/cache/store.rs::SimCache`.
pub struct Memo<K, V> {
    inner: RwLock<LruCache<K, (Instant, V)>>,
    ttl: Option<Duration>,
}

impl<K, V> std::fmt::Debug for Memo<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Build a memo holding at most `capacity` entries, each expiring
    /// `ttl` after insertion (`None` disables expiry).
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { inner: RwLock::new(LruCache::new(capacity)), ttl }
    }

    /// Fetch a live (non-expired) value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.write();
        let (inserted_at, value) = guard.get(key)?;
        if self.ttl.is_some_and(|ttl| inserted_at.elapsed() > ttl) {
            guard.pop(key);
            return None;
        }
        Some(value.clone())
    }

    /// Insert or replace the value for `key`.
    pub fn insert(&self, key: K, value: V) {
        self.inner.write().put(key, (Instant::now(), value));
    }

    /// Number of entries currently held, including any that are expired
    /// but not yet evicted.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the memo currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_none_after_ttl_expires() {
        let memo = Memo::new(4, Some(Duration::from_millis(10)));
        memo.insert("k", 1u32);
        assert_eq!(memo.get(&"k"), Some(1));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(memo.get(&"k"), None);
        assert!(memo.is_empty());
    }

    #[test]
    fn evicts_lru_beyond_capacity() {
        let memo: Memo<u32, u32> = Memo::new(1, None);
        memo.insert(1, 100);
        memo.insert(2, 200);
        assert_eq!(memo.get(&1), None);
        assert_eq!(memo.get(&2), Some(200));
    }
}
