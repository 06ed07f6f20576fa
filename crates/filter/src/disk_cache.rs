use crate::FilterError;
use alloy::primitives::Address;
use alloy::rpc::types::trace::parity::LocalizedTransactionTrace;
use alloy::rpc::types::Log;
use async_trait::async_trait;
use oracle_store::{LogCacheInfo, LogRow, Store, TraceCacheInfo, TraceRow};
use oracle_types::Chain;

/// Tracks which `[fromBlock, toBlock]` range has already been fetched
/// for some filter key, so a restarted process doesn't refetch history
/// it already has, and persists the actual rows fetched so a restarted
/// process doesn't lose them either — `cached_thru` alone only tells
/// the engine it doesn't need to refetch, not what it fetched.
///
/// Mirrors `y._db.common.DiskCache`, minus the in-process object cache
/// (`FilterEngine` owns that) — this trait is the persisted range
/// bookkeeping plus the row storage backing it.
#[async_trait]
pub trait DiskCache: Send + Sync {
    /// The item type this cache stores (a `Log`, a trace record, ...).
    /// Matches the [`crate::FilterSource::Item`] of whatever source
    /// this cache is paired with.
    type Item: Clone + Send + Sync + 'static;

    /// The last block (inclusive) known to be fully fetched, if any
    /// range has been recorded yet.
    async fn cached_thru(&self) -> Result<Option<u64>, FilterError>;

    /// Record that `[from, thru]` has now been fully fetched and
    /// persisted.
    async fn extend(&self, from: u64, thru: u64) -> Result<(), FilterError>;

    /// Persist `items`, fetched for `[from, thru]`, so a restarted
    /// process can reload them via [`Self::load`] instead of refetching.
    async fn commit(&self, from: u64, thru: u64, items: &[Self::Item]) -> Result<(), FilterError>;

    /// Reload every previously persisted item in `[from, thru]`, in
    /// fetch (block) order.
    async fn load(&self, from: u64, thru: u64) -> Result<Vec<Self::Item>, FilterError>;
}

/// [`DiskCache`] for a `(chain, address, topics)` log filter.
#[derive(Debug, Clone)]
pub struct LogDiskCache {
    store: Store,
    chain: Chain,
    address: Address,
    topics_key: Vec<u8>,
}

impl LogDiskCache {
    /// Build a disk cache for logs matching `address`/`topics_key` on
    /// `chain`. `topics_key` is an opaque fingerprint of the topic
    /// filter, produced by the caller (`LogFilter` owns its encoding)
    /// and reused here to tag every persisted row so [`Self::load`]
    /// reloads exactly the rows this filter instance produced.
    pub fn new(store: Store, chain: Chain, address: Address, topics_key: Vec<u8>) -> Self {
        Self { store, chain, address, topics_key }
    }
}

#[async_trait]
impl DiskCache for LogDiskCache {
    type Item = Log;

    async fn cached_thru(&self) -> Result<Option<u64>, FilterError> {
        let info = self.store.get_log_cache_info(self.chain, self.address, &self.topics_key).await?;
        Ok(info.map(|i| i.cached_thru))
    }

    async fn extend(&self, from: u64, thru: u64) -> Result<(), FilterError> {
        self.store
            .set_log_cache_info(&LogCacheInfo {
                chain_id: self.chain.id() as i64,
                address: self.address,
                topics_key: self.topics_key.clone(),
                cached_from: from,
                cached_thru: thru,
            })
            .await?;
        Ok(())
    }

    async fn commit(&self, _from: u64, _thru: u64, items: &[Log]) -> Result<(), FilterError> {
        if items.is_empty() {
            return Ok(());
        }
        let chain_id = self.chain.id() as i64;
        let rows = items
            .iter()
            .map(|log| {
                Ok(LogRow {
                    chain_id,
                    block_number: log.block_number.unwrap_or_default(),
                    tx_hash: log.transaction_hash.unwrap_or_default(),
                    log_index: log.log_index.unwrap_or_default(),
                    address: log.address(),
                    topics: log.topics().to_vec(),
                    filter_key: self.topics_key.clone(),
                    raw: serde_json::to_vec(log)?,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        self.store.bulk_insert_logs(&rows).await?;
        Ok(())
    }

    async fn load(&self, from: u64, thru: u64) -> Result<Vec<Log>, FilterError> {
        let rows = self.store.get_logs_by_filter_key(self.chain, &self.topics_key, from, thru).await?;
        rows.iter().map(|row| Ok(serde_json::from_slice(&row.raw)?)).collect()
    }
}

/// [`DiskCache`] for a `(chain, to_addresses, from_addresses)` trace
/// filter.
#[derive(Debug, Clone)]
pub struct TraceDiskCache {
    store: Store,
    chain: Chain,
    to_addresses: Vec<u8>,
    from_addresses: Vec<u8>,
}

impl TraceDiskCache {
    /// Build a disk cache for traces matching the given to/from address
    /// filters (each pre-serialized by the caller) on `chain`.
    pub fn new(store: Store, chain: Chain, to_addresses: Vec<u8>, from_addresses: Vec<u8>) -> Self {
        Self { store, chain, to_addresses, from_addresses }
    }

    /// The combined `(to_addresses, from_addresses)` fingerprint used to
    /// tag persisted rows, matching [`crate::TraceFilter::to_addresses_key`]
    /// concatenated with [`crate::TraceFilter::from_addresses_key`].
    fn filter_key(&self) -> Vec<u8> {
        let mut key = self.to_addresses.clone();
        key.extend_from_slice(&self.from_addresses);
        key
    }
}

#[async_trait]
impl DiskCache for TraceDiskCache {
    type Item = LocalizedTransactionTrace;

    async fn cached_thru(&self) -> Result<Option<u64>, FilterError> {
        let info = self
            .store
            .get_trace_cache_info(self.chain, &self.to_addresses, &self.from_addresses)
            .await?;
        Ok(info.map(|i| i.cached_thru))
    }

    async fn extend(&self, from: u64, thru: u64) -> Result<(), FilterError> {
        self.store
            .set_trace_cache_info(&TraceCacheInfo {
                chain_id: self.chain.id() as i64,
                to_addresses: self.to_addresses.clone(),
                from_addresses: self.from_addresses.clone(),
                cached_from: from,
                cached_thru: thru,
            })
            .await?;
        Ok(())
    }

    async fn commit(&self, _from: u64, _thru: u64, items: &[LocalizedTransactionTrace]) -> Result<(), FilterError> {
        if items.is_empty() {
            return Ok(());
        }
        let chain_id = self.chain.id() as i64;
        let filter_key = self.filter_key();
        let rows = items
            .iter()
            .map(|trace| {
                let action = &trace.trace.action;
                let (from_address, to_address) = match action {
                    alloy::rpc::types::trace::parity::Action::Call(c) => (Some(c.from), Some(c.to)),
                    alloy::rpc::types::trace::parity::Action::Create(c) => (Some(c.from), None),
                    alloy::rpc::types::trace::parity::Action::Selfdestruct(s) => (Some(s.address), Some(s.refund_address)),
                    alloy::rpc::types::trace::parity::Action::Reward(r) => (None, Some(r.author)),
                };
                Ok(TraceRow {
                    chain_id,
                    block_number: trace.block_number.unwrap_or_default(),
                    tx_hash: trace.transaction_hash,
                    from_address,
                    to_address,
                    filter_key: filter_key.clone(),
                    raw: serde_json::to_vec(trace)?,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        self.store.bulk_insert_traces(&rows).await?;
        Ok(())
    }

    async fn load(&self, from: u64, thru: u64) -> Result<Vec<LocalizedTransactionTrace>, FilterError> {
        let rows = self.store.get_traces_by_filter_key(self.chain, &self.filter_key(), from, thru).await?;
        rows.iter().map(|row| Ok(serde_json::from_slice(&row.raw)?)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle_store::Pool;

    async fn test_store() -> Store {
        let path = std::env::temp_dir().join(format!("oracle-filter-disk-cache-test-{}.sqlite", uuid::Uuid::new_v4()));
        let pool = Pool::connect_sqlite(path.to_str().unwrap()).await.unwrap();
        oracle_store::ensure_schema(&pool).await.unwrap();
        Store::from_pool(pool)
    }

    #[tokio::test]
    async fn log_disk_cache_round_trips_rows() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();
        let address = Address::repeat_byte(0x11);
        let cache = LogDiskCache::new(store, chain, address, b"topics".to_vec());

        let log_data = alloy::primitives::LogData::new_unchecked(vec![], alloy::primitives::Bytes::default());
        let log = Log {
            inner: alloy::primitives::Log { address, data: log_data },
            block_hash: None,
            block_number: Some(100),
            block_timestamp: None,
            transaction_hash: Some(alloy::primitives::B256::repeat_byte(0x22)),
            transaction_index: None,
            log_index: Some(0),
            removed: false,
        };

        cache.commit(100, 100, &[log.clone()]).await.unwrap();
        cache.extend(100, 100).await.unwrap();

        assert_eq!(cache.cached_thru().await.unwrap(), Some(100));
        let loaded = cache.load(0, 200).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].address(), address);
    }
}
