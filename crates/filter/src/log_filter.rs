use crate::engine::{FetchRange, FilterSource};
use crate::FilterError;
use alloy::primitives::{Address, B256};
use alloy::rpc::types::{Filter as RpcFilter, Log};
use async_trait::async_trait;
use oracle_rpc_client::RpcClient;
use std::sync::Arc;

/// A [`FilterSource`] yielding `eth_getLogs` matches for a fixed
/// `(address, topics)` filter, chunked over the requested block range.
///
/// Mirrors the log-fetching concrete subclasses of `y._db.common.Filter`
/// used throughout `y.prices` to watch pool creation/swap events.
#[derive(Debug, Clone)]
pub struct LogFilter {
    client: Arc<dyn RpcClient>,
    address: Address,
    topics: Vec<B256>,
}

impl LogFilter {
    /// Watch logs from `address` matching `topics` (topic0 first).
    pub fn new(client: Arc<dyn RpcClient>, address: Address, topics: Vec<B256>) -> Self {
        Self { client, address, topics }
    }

    /// A fingerprint of this filter's `(address, topics)`, suitable as a
    /// [`crate::LogDiskCache`] key.
    pub fn topics_key(&self) -> Vec<u8> {
        let mut key = self.address.to_vec();
        for topic in &self.topics {
            key.extend_from_slice(topic.as_slice());
        }
        key
    }

    /// The address this filter watches.
    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl FilterSource for LogFilter {
    type Item = Log;

    async fn fetch_range(&self, range: FetchRange) -> Result<Vec<Log>, FilterError> {
        let mut filter = RpcFilter::new().address(self.address).from_block(range.from).to_block(range.to);
        if let Some((topic0, rest)) = self.topics.split_first() {
            filter = filter.event_signature(*topic0);
            for (i, topic) in rest.iter().enumerate() {
                filter = match i {
                    0 => filter.topic1(*topic),
                    1 => filter.topic2(*topic),
                    _ => filter.topic3(*topic),
                };
            }
        }
        let mut logs = self.client.get_logs(&filter).await?;
        logs.sort_by_key(|log| (log.block_number.unwrap_or_default(), log.log_index.unwrap_or_default()));
        Ok(logs)
    }

    async fn head(&self) -> Result<u64, FilterError> {
        Ok(self.client.block_number().await?)
    }
}
