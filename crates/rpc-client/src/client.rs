use crate::RpcError;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::trace::filter::TraceFilter;
use alloy::rpc::types::trace::parity::LocalizedTransactionTrace;
use alloy::rpc::types::{Block, Filter, Log, TransactionRequest};
use async_trait::async_trait;

/// The subset of EVM JSON-RPC methods the filter engine and price
/// router need, behind one trait so both can run against a mock
/// transport in tests.
#[async_trait]
pub trait RpcClient: std::fmt::Debug + Send + Sync {
    /// `eth_call` against the given block, or latest if `None`.
    async fn call(&self, tx: &TransactionRequest, block: Option<u64>) -> Result<Bytes, RpcError>;

    /// `eth_getLogs` for the given filter.
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, RpcError>;

    /// `eth_getCode` at the given block, or latest if `None`.
    async fn get_code(&self, address: Address, block: Option<u64>) -> Result<Bytes, RpcError>;

    /// `eth_getBlockByNumber`, without full transaction bodies.
    async fn get_block_by_number(&self, block: u64) -> Result<Option<Block>, RpcError>;

    /// `eth_getStorageAt` at the given block, or latest if `None`.
    async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: Option<u64>,
    ) -> Result<B256, RpcError>;

    /// `trace_filter`.
    async fn trace_filter(
        &self,
        filter: &TraceFilter,
    ) -> Result<Vec<LocalizedTransactionTrace>, RpcError>;

    /// `trace_block`.
    async fn trace_block(&self, block: u64) -> Result<Vec<LocalizedTransactionTrace>, RpcError>;

    /// The current chain head's block number.
    async fn block_number(&self) -> Result<u64, RpcError>;

    /// The Unix timestamp of `block`, used by feed-staleness checks
    /// (e.g. Chainlink's `latestTimestamp + 24h < block.timestamp`).
    async fn block_timestamp(&self, block: u64) -> Result<u64, RpcError>;
}
