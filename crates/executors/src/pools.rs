use crate::BlockSemaphore;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A named concurrency budget. Every pricing strategy that issues RPC
/// calls acquires a permit from the pool matching its workload before
/// dispatching, so one noisy strategy can't starve the others.
///
/// Grounded on `y._db.common.make_executor(small, big)`, which hands out
/// a small thread pool for index/db-bound lookups and a much larger one
/// for RPC-bound fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolName {
    /// Cheap, DB/cache-bound lookups (token metadata, cached prices).
    Lookup,
    /// `eth_call`/`eth_getLogs` RPC-bound work.
    Rpc,
    /// Trace-filter fetches, which are far more expensive per call than
    /// plain log fetches on most providers.
    Trace,
    /// Calls to the optional remote price-oracle fallback.
    RemoteOracle,
    /// Store reads. A `Store` connection pool already bounds raw
    /// connection count, but this gives reads their own budget separate
    /// from writes so a burst of cache reads can't starve pending
    /// writes (or vice versa) the way sharing one pool would.
    DbRead,
    /// Store writes (inserts/upserts/clear/nuke). Kept much smaller than
    /// `DbRead` since writes contend on SQLite's single-writer lock;
    /// over-admitting them just adds `retry_locked` backoff churn.
    DbWrite,
}

impl PoolName {
    const fn default_capacity(self) -> usize {
        match self {
            Self::Lookup => 64,
            Self::Rpc => 32,
            Self::Trace => 8,
            Self::RemoteOracle => 8,
            Self::DbRead => 32,
            Self::DbWrite => 4,
        }
    }
}

/// A registry of named bounded pools, built lazily on first use, plus
/// the one [`BlockSemaphore`] shared by every filter engine and pricing
/// call that needs cross-block fairness.
#[derive(Debug, Clone)]
pub struct Executors {
    pools: Arc<DashMap<PoolName, Arc<Semaphore>>>,
    block_semaphore: BlockSemaphore,
}

impl Default for Executors {
    fn default() -> Self {
        Self { pools: Arc::new(DashMap::new()), block_semaphore: BlockSemaphore::new(PoolName::Rpc.default_capacity()) }
    }
}

impl Executors {
    /// Build an empty registry; pools are created on first acquisition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a permit from `pool`, waiting if it's fully booked.
    pub async fn acquire(&self, pool: PoolName) -> OwnedSemaphorePermit {
        let sem = self
            .pools
            .entry(pool)
            .or_insert_with(|| Arc::new(Semaphore::new(pool.default_capacity())))
            .clone();
        sem.acquire_owned().await.expect("semaphore is never closed")
    }

    /// Current number of permits in use for `pool`. Mostly useful for
    /// diagnostics/tests.
    pub fn in_flight(&self, pool: PoolName) -> usize {
        self.pools
            .get(&pool)
            .map(|sem| pool.default_capacity() - sem.available_permits())
            .unwrap_or(0)
    }

    /// The shared cross-block-fair semaphore, bounding concurrent
    /// per-block work (catch-up chunk fetches, pricing calls) at the
    /// same budget as [`PoolName::Rpc`] while always granting the
    /// lowest pending block number first.
    pub fn block_semaphore(&self) -> BlockSemaphore {
        self.block_semaphore.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_bounds_concurrency() {
        let executors = Executors::new();
        let permit = executors.acquire(PoolName::Trace).await;
        assert_eq!(executors.in_flight(PoolName::Trace), 1);
        drop(permit);
        assert_eq!(executors.in_flight(PoolName::Trace), 0);
    }
}
