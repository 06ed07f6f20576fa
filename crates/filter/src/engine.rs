use crate::{DiskCache, FilterError};
use async_trait::async_trait;
use futures::StreamExt;
use oracle_executors::BlockSemaphore;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// An inclusive block range to fetch in one RPC round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRange {
    /// First block (inclusive).
    pub from: u64,
    /// Last block (inclusive).
    pub to: u64,
}

/// The fetch primitive a concrete filter ([`crate::LogFilter`],
/// [`crate::TraceFilter`]) provides: given a chunk of the requested
/// range, return every matching item in it, in block order.
///
/// Mirrors `y._db.common.Filter._fetch_range`.
#[async_trait]
pub trait FilterSource: Send + Sync {
    /// The item type this source yields (a `Log`, a trace record, ...).
    type Item: Clone + Send + Sync + 'static;

    /// Fetch every matching item in `range`, in ascending block order.
    async fn fetch_range(&self, range: FetchRange) -> Result<Vec<Self::Item>, FilterError>;

    /// The chain's current head block number, for the self-driving
    /// background task ([`FilterEngine::spawn`]) to know how far it
    /// needs to catch up before going idle.
    async fn head(&self) -> Result<u64, FilterError>;

    /// Block number to assign items for replay-from-block purposes. The
    /// default chunk size to fetch per RPC round trip.
    fn chunk_size(&self) -> u64 {
        2_000
    }
}

/// What a [`FilterEngine`]'s background task ([`FilterEngine::spawn`])
/// is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Working through the gap between the last fetched block and the
    /// chain head.
    CatchingUp,
    /// Caught up to the head as of the last poll; sleeping until the
    /// next one.
    Live,
    /// A fetch failed; backing off before retrying.
    Backoff,
    /// [`SpawnHandle::cancel`] was called; the task has exited.
    Stopped,
}

/// A handle to a [`FilterEngine::spawn`]ed background task. Dropping
/// this without calling [`Self::cancel`] leaves the task running —
/// callers that want a clean shutdown must cancel explicitly.
#[derive(Debug)]
pub struct SpawnHandle {
    cancel: Arc<AtomicBool>,
    wake: Arc<Notify>,
    join: tokio::task::JoinHandle<()>,
}

impl SpawnHandle {
    /// Signal the background task to stop after its current fetch
    /// completes, waking it immediately if it's sleeping between polls.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.wake.notify_waiters();
    }

    /// Wait for the task to actually exit. Returns
    /// [`FilterError::TaskDied`] if it panicked rather than returning
    /// normally.
    pub async fn join(self) -> Result<(), FilterError> {
        self.join.await.map_err(|_| FilterError::TaskDied)
    }
}

/// Drives a [`FilterSource`] forward in chunks, appending every fetched
/// item to an in-memory, append-only log that any number of consumers
/// can replay from an arbitrary `from_block`, and persisting both the
/// `[from, thru]` range covered so far and the rows themselves to a
/// [`DiskCache`] so a restarted process resumes with its full history
/// intact instead of refetching (or silently missing) it.
///
/// Grounded on `y._db.common.Filter`'s `_loop`/`_objects_thru` pair — a
/// single background task advances a checkpoint (`CounterLock` there,
/// `Notify` here) that any number of `_objects_thru` consumers await,
/// sleeping 60 seconds between polls once caught up to the head and
/// catching up concurrently (bounded by a shared [`BlockSemaphore`])
/// otherwise. Rust's lack of re-entrant async generators is why
/// consumers here replay from a plain `Vec` snapshot rather than
/// resuming a paused iterator.
#[derive(Debug, Clone)]
pub struct FilterEngine<T> {
    objects: Arc<RwLock<Vec<T>>>,
    cached_thru: Arc<RwLock<Option<u64>>>,
    notify: Arc<Notify>,
    state: Arc<RwLock<EngineState>>,
}

impl<T: Clone + Send + Sync + 'static> Default for FilterEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> FilterEngine<T> {
    /// Build an empty engine with nothing fetched yet.
    pub fn new() -> Self {
        Self {
            objects: Arc::new(RwLock::new(Vec::new())),
            cached_thru: Arc::new(RwLock::new(None)),
            notify: Arc::new(Notify::new()),
            state: Arc::new(RwLock::new(EngineState::CatchingUp)),
        }
    }

    /// The last block known to be fully fetched and appended, if any.
    pub fn cached_thru(&self) -> Option<u64> {
        *self.cached_thru.read()
    }

    /// What the background task (if one is running) is doing right now.
    pub fn state(&self) -> EngineState {
        *self.state.read()
    }

    fn set_state(&self, state: EngineState) {
        *self.state.write() = state;
    }

    /// Every item appended so far, in fetch (block) order. Cheap to
    /// call repeatedly: consumers typically call this once to resume
    /// history, then `wait_for_more` to block until the next chunk
    /// lands.
    pub fn snapshot(&self) -> Vec<T> {
        self.objects.read().clone()
    }

    /// Resolve once the engine has appended at least one item since the
    /// last call, or been notified of a (possibly empty) chunk landing.
    pub async fn wait_for_more(&self) {
        self.notify.notified().await;
    }

    /// If this engine has nothing in memory yet (a fresh process), load
    /// whatever `disk_cache` already has for `[from, disk_thru]` before
    /// any fetch happens, so a restart resumes with full history rather
    /// than an empty snapshot that happens to report the old
    /// `cached_thru`.
    async fn hydrate<D: DiskCache<Item = T>>(&self, disk_cache: &D, from: u64) -> Result<(), FilterError> {
        if self.cached_thru().is_some() {
            return Ok(());
        }
        let Some(disk_thru) = disk_cache.cached_thru().await? else {
            return Ok(());
        };
        if disk_thru < from {
            return Ok(());
        }
        let items = disk_cache.load(from, disk_thru).await?;
        self.objects.write().extend(items);
        *self.cached_thru.write() = Some(disk_thru);
        self.notify.notify_waiters();
        Ok(())
    }

    /// Fetch and persist every chunk of `[from, target]` not already
    /// covered by `disk_cache`/this engine's in-memory state, in order.
    ///
    /// Safe to call repeatedly (e.g. on a timer, once per new chain
    /// head) to incrementally extend coverage: each call only fetches
    /// the gap between what's already covered and `target`.
    pub async fn advance_to<S, D>(&self, source: &S, disk_cache: &D, from: u64, target: u64) -> Result<(), FilterError>
    where
        S: FilterSource<Item = T>,
        D: DiskCache<Item = T>,
    {
        if target < from {
            return Ok(());
        }
        self.hydrate(disk_cache, from).await?;

        let already_thru = match (self.cached_thru(), disk_cache.cached_thru().await?) {
            (Some(mem), Some(disk)) => Some(mem.max(disk)),
            (Some(mem), None) => Some(mem),
            (None, Some(disk)) => Some(disk),
            (None, None) => None,
        };
        let start = already_thru.map(|t| t + 1).unwrap_or(from).max(from);
        if start > target {
            return Ok(());
        }

        let chunk_size = source.chunk_size().max(1);
        let mut cursor = start;
        while cursor <= target {
            let chunk_end = (cursor + chunk_size - 1).min(target);
            let range = FetchRange { from: cursor, to: chunk_end };
            let items = source.fetch_range(range).await?;

            tracing::debug!(from = range.from, to = range.to, found = items.len(), "fetched filter chunk");

            self.objects.write().extend(items.clone());
            *self.cached_thru.write() = Some(chunk_end);
            disk_cache.commit(range.from, range.to, &items).await?;
            disk_cache.extend(start, chunk_end).await?;
            self.notify.notify_waiters();

            cursor = chunk_end + 1;
        }
        Ok(())
    }

    /// Spawn the self-driving background task: catches up from `from`
    /// to the chain head in concurrent, semaphore-gated chunks (older
    /// chunks committed strictly in fetch order even though they may
    /// finish fetching out of order), then sleeps `poll_interval`
    /// before checking the head again. Safe to call once per watch; call [`SpawnHandle::cancel`]
    /// to stop it.
    pub fn spawn<S, D>(&self, source: S, disk_cache: D, from: u64, semaphore: BlockSemaphore, poll_interval: Duration) -> SpawnHandle
    where
        S: FilterSource<Item = T> + Clone + Send + Sync + 'static,
        D: DiskCache<Item = T> + Clone + Send + Sync + 'static,
    {
        let engine = self.clone();
        let cancel = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let cancel_task = cancel.clone();
        let wake_task = wake.clone();

        let join = tokio::spawn(async move {
            engine.run(source, disk_cache, from, semaphore, poll_interval, cancel_task, wake_task).await;
        });

        SpawnHandle { cancel, wake, join }
    }

    async fn run<S, D>(
        self,
        source: S,
        disk_cache: D,
        from: u64,
        semaphore: BlockSemaphore,
        poll_interval: Duration,
        cancel: Arc<AtomicBool>,
        wake: Arc<Notify>,
    ) where
        S: FilterSource<Item = T>,
        D: DiskCache<Item = T>,
    {
        self.set_state(EngineState::CatchingUp);
        if let Err(e) = self.hydrate(&disk_cache, from).await {
            tracing::error!(error = %e, "filter engine failed to hydrate from disk cache");
        }

        loop {
            if cancel.load(Ordering::SeqCst) {
                self.set_state(EngineState::Stopped);
                return;
            }

            let head = match source.head().await {
                Ok(head) => head,
                Err(e) => {
                    tracing::warn!(error = %e, "filter engine failed to read chain head");
                    self.set_state(EngineState::Backoff);
                    Self::sleep_or_wake(poll_interval, &cancel, &wake).await;
                    continue;
                }
            };

            let disk_thru = disk_cache.cached_thru().await.ok().flatten();
            let already_thru = match (self.cached_thru(), disk_thru) {
                (Some(mem), Some(disk)) => Some(mem.max(disk)),
                (Some(mem), None) => Some(mem),
                (None, Some(disk)) => Some(disk),
                (None, None) => None,
            };
            let start = already_thru.map(|t| t + 1).unwrap_or(from).max(from);

            if start <= head {
                self.set_state(EngineState::CatchingUp);
                if let Err(e) = self.catch_up(&source, &disk_cache, &semaphore, from, start, head).await {
                    tracing::error!(error = %e, "filter engine catch-up failed, backing off");
                    self.set_state(EngineState::Backoff);
                    Self::sleep_or_wake(poll_interval, &cancel, &wake).await;
                    continue;
                }
            }

            self.set_state(EngineState::Live);
            Self::sleep_or_wake(poll_interval, &cancel, &wake).await;
        }
    }

    /// Fetch `[start, head]` in `source.chunk_size()` chunks, up to one
    /// in flight per [`BlockSemaphore`] permit, committing each chunk to
    /// `disk_cache` strictly in ascending order once it's ready — a
    /// chunk that finishes fetching before an earlier one still waits
    /// for it before writing, so `cached_thru` only ever advances
    /// monotonically.
    async fn catch_up<S, D>(
        &self,
        source: &S,
        disk_cache: &D,
        semaphore: &BlockSemaphore,
        overall_from: u64,
        start: u64,
        head: u64,
    ) -> Result<(), FilterError>
    where
        S: FilterSource<Item = T>,
        D: DiskCache<Item = T>,
    {
        let chunk_size = source.chunk_size().max(1);
        let mut ranges = Vec::new();
        let mut cursor = start;
        while cursor <= head {
            let end = (cursor + chunk_size - 1).min(head);
            ranges.push(FetchRange { from: cursor, to: end });
            cursor = end + 1;
        }

        // `buffered`'s concurrency cap just bounds how many chunk futures
        // are polled at once; actual fetch admission is gated by
        // `semaphore` inside each one, so this only needs to be "enough
        // to keep the semaphore saturated," not the true concurrency.
        const MAX_CONCURRENT_CHUNKS: usize = 16;
        let mut pending = Vec::with_capacity(ranges.len());
        for range in &ranges {
            pending.push(fetch_one_chunk(source, semaphore, *range));
        }
        let mut pending = futures::stream::iter(pending).buffered(MAX_CONCURRENT_CHUNKS.min(ranges.len().max(1)));

        for range in &ranges {
            let items = match pending.next().await {
                Some(Ok(items)) => items,
                Some(Err(e)) if is_unfetchable_range(&e) => {
                    tracing::warn!(from = range.from, to = range.to, error = %e, "range unavailable from provider, skipping");
                    Vec::new()
                }
                Some(Err(e)) => return Err(e),
                None => break,
            };

            tracing::debug!(from = range.from, to = range.to, found = items.len(), "fetched filter chunk");

            self.objects.write().extend(items.clone());
            *self.cached_thru.write() = Some(range.to);
            disk_cache.commit(range.from, range.to, &items).await?;
            disk_cache.extend(overall_from, range.to).await?;
            self.notify.notify_waiters();
        }
        Ok(())
    }

    async fn sleep_or_wake(poll_interval: Duration, cancel: &Arc<AtomicBool>, wake: &Arc<Notify>) {
        if cancel.load(Ordering::SeqCst) {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = wake.notified() => {}
        }
    }
}

async fn fetch_one_chunk<S>(source: &S, semaphore: &BlockSemaphore, range: FetchRange) -> Result<Vec<S::Item>, FilterError>
where
    S: FilterSource,
{
    let _permit = semaphore.acquire(range.from).await;
    source.fetch_range(range).await
}

/// Whether `e` indicates the provider simply doesn't have the requested
/// historical range (a pruned full node serving `eth_getLogs`/
/// `trace_filter` for a range it no longer retains state for), as
/// opposed to a transient or permanent failure. These ranges will never
/// succeed on retry, so the catch-up loop skips them rather than
/// backing off forever.
fn is_unfetchable_range(e: &FilterError) -> bool {
    let FilterError::Rpc(oracle_rpc_client::RpcError::Transport(msg)) = e else {
        return false;
    };
    msg.contains("missing trie node") || msg.contains("one of the blocks specified in filter")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[derive(Debug, Default, Clone)]
    struct NullDiskCache {
        thru: Arc<parking_lot::Mutex<Option<u64>>>,
        rows: Arc<parking_lot::Mutex<Vec<(u64, u64)>>>,
    }

    #[async_trait]
    impl DiskCache for NullDiskCache {
        type Item = u64;

        async fn cached_thru(&self) -> Result<Option<u64>, FilterError> {
            Ok(*self.thru.lock())
        }
        async fn extend(&self, _from: u64, thru: u64) -> Result<(), FilterError> {
            *self.thru.lock() = Some(thru);
            Ok(())
        }
        async fn commit(&self, from: u64, thru: u64, _items: &[u64]) -> Result<(), FilterError> {
            self.rows.lock().push((from, thru));
            Ok(())
        }
        async fn load(&self, _from: u64, _thru: u64) -> Result<Vec<u64>, FilterError> {
            Ok(Vec::new())
        }
    }

    #[derive(Clone)]
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        head: u64,
    }

    #[async_trait]
    impl FilterSource for CountingSource {
        type Item = u64;

        async fn fetch_range(&self, range: FetchRange) -> Result<Vec<u64>, FilterError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok((range.from..=range.to).collect())
        }

        async fn head(&self) -> Result<u64, FilterError> {
            Ok(self.head)
        }

        fn chunk_size(&self) -> u64 {
            10
        }
    }

    #[tokio::test]
    async fn advance_to_fetches_only_the_gap() {
        let engine: FilterEngine<u64> = FilterEngine::new();
        let disk = NullDiskCache::default();
        let source = CountingSource { calls: Arc::new(AtomicUsize::new(0)), head: 1_000 };

        engine.advance_to(&source, &disk, 0, 25).await.unwrap();
        assert_eq!(engine.cached_thru(), Some(25));
        assert_eq!(engine.snapshot().len(), 26);
        let calls_after_first = source.calls.load(AtomicOrdering::SeqCst);
        assert_eq!(calls_after_first, 3); // [0,9] [10,19] [20,25]

        // Re-running with the same target must not refetch anything.
        engine.advance_to(&source, &disk, 0, 25).await.unwrap();
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), calls_after_first);

        // Extending the target only fetches the new gap.
        engine.advance_to(&source, &disk, 0, 35).await.unwrap();
        assert_eq!(engine.cached_thru(), Some(35));
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), calls_after_first + 1);
    }

    #[tokio::test]
    async fn advance_to_hydrates_from_disk_cache_on_a_fresh_engine() {
        let disk = NullDiskCache::default();
        *disk.thru.lock() = Some(19);
        let source = CountingSource { calls: Arc::new(AtomicUsize::new(0)), head: 1_000 };

        // A fresh engine (e.g. after a restart) must pick up where the
        // disk cache left off without refetching [0, 19].
        let engine: FilterEngine<u64> = FilterEngine::new();
        engine.advance_to(&source, &disk, 0, 19).await.unwrap();
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 0);
        assert_eq!(engine.cached_thru(), Some(19));
    }

    #[tokio::test]
    async fn spawn_catches_up_then_reports_live_and_stops_on_cancel() {
        let engine: FilterEngine<u64> = FilterEngine::new();
        let disk = NullDiskCache::default();
        let source = CountingSource { calls: Arc::new(AtomicUsize::new(0)), head: 25 };
        let semaphore = BlockSemaphore::new(4);

        let handle = engine.spawn(source, disk, 0, semaphore, Duration::from_secs(60));

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if engine.state() == EngineState::Live {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("engine should catch up and go live");

        assert_eq!(engine.cached_thru(), Some(25));
        assert_eq!(engine.snapshot().len(), 26);

        handle.cancel();
        handle.join().await.unwrap();
        assert_eq!(engine.state(), EngineState::Stopped);
    }
}
