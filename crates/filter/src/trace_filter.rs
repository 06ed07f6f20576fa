use crate::engine::{FetchRange, FilterSource};
use crate::FilterError;
use alloy::primitives::Address;
use alloy::rpc::types::trace::filter::TraceFilter as RpcTraceFilter;
use alloy::rpc::types::trace::parity::LocalizedTransactionTrace;
use async_trait::async_trait;
use oracle_rpc_client::RpcClient;
use std::sync::Arc;

/// A [`FilterSource`] yielding `trace_filter` matches for a fixed
/// `(to_addresses, from_addresses)` filter, chunked over the requested
/// block range.
///
/// Mirrors the trace-fetching concrete subclasses of
/// `y._db.common.Filter`, used for strategies that can't identify their
/// pools via logs alone (internal-call-only interactions).
#[derive(Debug, Clone)]
pub struct TraceFilter {
    client: Arc<dyn RpcClient>,
    to_addresses: Vec<Address>,
    from_addresses: Vec<Address>,
}

impl TraceFilter {
    /// Watch traces whose `to`/`from` match the given allowlists. An
    /// empty list means "any address".
    pub fn new(client: Arc<dyn RpcClient>, to_addresses: Vec<Address>, from_addresses: Vec<Address>) -> Self {
        Self { client, to_addresses, from_addresses }
    }

    /// Serialized `to_addresses`, suitable as a [`crate::TraceDiskCache`]
    /// key component.
    pub fn to_addresses_key(&self) -> Vec<u8> {
        self.to_addresses.iter().flat_map(|a| a.to_vec()).collect()
    }

    /// Serialized `from_addresses`, suitable as a
    /// [`crate::TraceDiskCache`] key component.
    pub fn from_addresses_key(&self) -> Vec<u8> {
        self.from_addresses.iter().flat_map(|a| a.to_vec()).collect()
    }
}

#[async_trait]
impl FilterSource for TraceFilter {
    type Item = LocalizedTransactionTrace;

    async fn fetch_range(&self, range: FetchRange) -> Result<Vec<LocalizedTransactionTrace>, FilterError> {
        let mut filter = RpcTraceFilter::default().from_block(range.from).to_block(range.to);
        if !self.to_addresses.is_empty() {
            filter = filter.to_address(self.to_addresses.clone());
        }
        if !self.from_addresses.is_empty() {
            filter = filter.from_address(self.from_addresses.clone());
        }
        let traces = self.client.trace_filter(&filter).await?;
        Ok(traces)
    }

    async fn head(&self) -> Result<u64, FilterError> {
        Ok(self.client.block_number().await?)
    }

    fn chunk_size(&self) -> u64 {
        // Trace fetches are far more expensive per block than log
        // fetches on most providers.
        200
    }
}
