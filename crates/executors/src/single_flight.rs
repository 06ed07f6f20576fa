use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

type InFlight<V> = Shared<BoxFuture<'static, V>>;

/// Deduplicates concurrent requests for the same key: if a second caller
/// asks for a key while the first request is still in flight, it is
/// handed a clone of the same future instead of starting its own.
///
/// Used by the price router to collapse concurrent `get_price` calls for
/// the same `(token, block)` into one RPC round trip, and by the filter
/// engine to collapse concurrent requests for the same block range.
///
/// Grounded on the `DashMap`-of-handles registry pattern in
/// `init4tech-signet-sdk/crates/rpc/src/interest/filters.rs`.
pub struct SingleFlight<K, V> {
    inflight: Arc<DashMap<K, InFlight<V>>>,
}

impl<K, V> std::fmt::Debug for SingleFlight<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight").finish_non_exhaustive()
    }
}

impl<K, V> Clone for SingleFlight<K, V> {
    fn clone(&self) -> Self {
        Self { inflight: self.inflight.clone() }
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self { inflight: Arc::new(DashMap::new()) }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Build an empty registry.
    pub fn new() -> Self {
        Self { inflight: Arc::new(DashMap::new()) }
    }

    /// Run `make` for `key` unless a call for the same key is already in
    /// flight, in which case await that call's result instead.
    pub async fn run<F>(&self, key: K, make: impl FnOnce() -> F) -> V
    where
        F: Future<Output = V> + Send + 'static,
    {
        let existing = self.inflight.get(&key).map(|f| f.value().clone());
        if let Some(fut) = existing {
            return fut.await;
        }

        let fut: InFlight<V> = make().boxed().shared();
        self.inflight.insert(key.clone(), fut.clone());
        let result = fut.await;
        self.inflight.remove(&key);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_calls_share_one_execution() {
        let flight: SingleFlight<u64, u32> = SingleFlight::new();
        let calls = Arc::new(AtomicU32::new(0));

        let run_once = |flight: SingleFlight<u64, u32>, calls: Arc<AtomicU32>| async move {
            flight
                .run(1, || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        42
                    }
                })
                .await
        };

        let (a, b) = tokio::join!(
            run_once(flight.clone(), calls.clone()),
            run_once(flight.clone(), calls.clone())
        );

        assert_eq!(a, 42);
        assert_eq!(b, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
