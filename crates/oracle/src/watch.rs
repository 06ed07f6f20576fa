use crate::RuntimeError;
use alloy::primitives::Address;
use alloy::rpc::types::Log;
use alloy::rpc::types::trace::parity::LocalizedTransactionTrace;
use oracle_executors::BlockSemaphore;
use oracle_filter::{EngineState, FilterEngine, LogDiskCache, LogFilter, SpawnHandle, TraceDiskCache, TraceFilter};
use std::time::Duration;

/// A live `(address, topics)` log watch: an in-memory, append-only
/// history plus a disk-backed checkpoint, advanced either on demand via
/// [`Self::advance_to`] or continuously by [`Self::spawn`].
///
/// Grounded on `original_source/y/_db/common.py`'s pattern of one
/// `Filter` per watched event signature, driven forward by a background
/// `_loop` task that any number of consumers replay from.
#[derive(Debug, Clone)]
pub struct LogWatch {
    engine: FilterEngine<Log>,
    source: LogFilter,
    disk_cache: LogDiskCache,
    semaphore: BlockSemaphore,
}

impl LogWatch {
    pub(crate) fn new(source: LogFilter, disk_cache: LogDiskCache, semaphore: BlockSemaphore) -> Self {
        Self { engine: FilterEngine::new(), source, disk_cache, semaphore }
    }

    /// The address this watch tracks.
    pub fn address(&self) -> Address {
        self.source.address()
    }

    /// Fetch and persist every chunk of `[from, target]` not already
    /// covered.
    pub async fn advance_to(&self, from: u64, target: u64) -> Result<(), RuntimeError> {
        self.engine.advance_to(&self.source, &self.disk_cache, from, target).await?;
        Ok(())
    }

    /// Start the self-driving background task: catches up from `from`
    /// to the chain head, then polls for new blocks every
    /// `poll_interval`. Call [`SpawnHandle::cancel`] on the returned
    /// handle to stop it.
    pub fn spawn(&self, from: u64, poll_interval: Duration) -> SpawnHandle {
        self.engine.spawn(self.source.clone(), self.disk_cache.clone(), from, self.semaphore.clone(), poll_interval)
    }

    /// What the background task (if one is running) is doing right now.
    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    /// The last block known to be fully fetched, if any.
    pub fn cached_thru(&self) -> Option<u64> {
        self.engine.cached_thru()
    }

    /// Every log appended so far, in block order.
    pub fn snapshot(&self) -> Vec<Log> {
        self.engine.snapshot()
    }

    /// Resolve once a new chunk (possibly empty) has landed.
    pub async fn wait_for_more(&self) {
        self.engine.wait_for_more().await
    }
}

/// As [`LogWatch`], but for `trace_filter` matches on a `(to, from)`
/// address pair.
#[derive(Debug, Clone)]
pub struct TraceWatch {
    engine: FilterEngine<LocalizedTransactionTrace>,
    source: TraceFilter,
    disk_cache: TraceDiskCache,
    semaphore: BlockSemaphore,
}

impl TraceWatch {
    pub(crate) fn new(source: TraceFilter, disk_cache: TraceDiskCache, semaphore: BlockSemaphore) -> Self {
        Self { engine: FilterEngine::new(), source, disk_cache, semaphore }
    }

    /// Fetch and persist every chunk of `[from, target]` not already
    /// covered.
    pub async fn advance_to(&self, from: u64, target: u64) -> Result<(), RuntimeError> {
        self.engine.advance_to(&self.source, &self.disk_cache, from, target).await?;
        Ok(())
    }

    /// Start the self-driving background task: catches up from `from`
    /// to the chain head, then polls for new blocks every
    /// `poll_interval`. Call [`SpawnHandle::cancel`] on the returned
    /// handle to stop it.
    pub fn spawn(&self, from: u64, poll_interval: Duration) -> SpawnHandle {
        self.engine.spawn(self.source.clone(), self.disk_cache.clone(), from, self.semaphore.clone(), poll_interval)
    }

    /// What the background task (if one is running) is doing right now.
    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    /// The last block known to be fully fetched, if any.
    pub fn cached_thru(&self) -> Option<u64> {
        self.engine.cached_thru()
    }

    /// Every trace appended so far, in block order.
    pub fn snapshot(&self) -> Vec<LocalizedTransactionTrace> {
        self.engine.snapshot()
    }

    /// Resolve once a new chunk (possibly empty) has landed.
    pub async fn wait_for_more(&self) {
        self.engine.wait_for_more().await
    }
}
