use crate::{RpcClient, RpcError};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::trace::filter::TraceFilter;
use alloy::rpc::types::trace::parity::LocalizedTransactionTrace;
use alloy::rpc::types::{Block, Filter, Log, TransactionRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// An in-memory [`RpcClient`] for tests: every method either returns a
/// canned value keyed by its arguments, or [`RpcError::Unmocked`] if
/// none was configured.
#[derive(Debug, Default)]
pub struct MockRpcClient {
    calls: Mutex<HashMap<(Address, Option<u64>), Bytes>>,
    logs: Mutex<Vec<Log>>,
    codes: Mutex<HashMap<Address, Bytes>>,
    storage: Mutex<HashMap<(Address, U256), B256>>,
    block_number: Mutex<u64>,
    block_timestamps: Mutex<HashMap<u64, u64>>,
}

impl MockRpcClient {
    /// Build an empty mock with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `eth_call`s to `to` at `block` return `data`.
    pub fn set_call(&self, to: Address, block: Option<u64>, data: Bytes) {
        self.calls.lock().insert((to, block), data);
    }

    /// Make `eth_getLogs` return `logs` regardless of filter.
    pub fn set_logs(&self, logs: Vec<Log>) {
        *self.logs.lock() = logs;
    }

    /// Make `eth_getCode` for `address` return `code`.
    pub fn set_code(&self, address: Address, code: Bytes) {
        self.codes.lock().insert(address, code);
    }

    /// Make `eth_getStorageAt` for `(address, slot)` return `value`.
    pub fn set_storage(&self, address: Address, slot: U256, value: B256) {
        self.storage.lock().insert((address, slot), value);
    }

    /// Set the block number `block_number()` reports.
    pub fn set_block_number(&self, number: u64) {
        *self.block_number.lock() = number;
    }

    /// Make `block_timestamp(block)` return `timestamp`.
    pub fn set_block_timestamp(&self, block: u64, timestamp: u64) {
        self.block_timestamps.lock().insert(block, timestamp);
    }
}

#[async_trait]
impl RpcClient for MockRpcClient {
    async fn call(&self, tx: &TransactionRequest, block: Option<u64>) -> Result<Bytes, RpcError> {
        let to = tx.to.and_then(|to| to.to()).copied().unwrap_or_default();
        self.calls.lock().get(&(to, block)).cloned().ok_or(RpcError::Unmocked)
    }

    async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>, RpcError> {
        Ok(self.logs.lock().clone())
    }

    async fn get_code(&self, address: Address, _block: Option<u64>) -> Result<Bytes, RpcError> {
        self.codes.lock().get(&address).cloned().ok_or(RpcError::Unmocked)
    }

    async fn get_block_by_number(&self, _block: u64) -> Result<Option<Block>, RpcError> {
        Ok(None)
    }

    async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        _block: Option<u64>,
    ) -> Result<B256, RpcError> {
        self.storage.lock().get(&(address, slot)).copied().ok_or(RpcError::Unmocked)
    }

    async fn trace_filter(
        &self,
        _filter: &TraceFilter,
    ) -> Result<Vec<LocalizedTransactionTrace>, RpcError> {
        Ok(Vec::new())
    }

    async fn trace_block(&self, _block: u64) -> Result<Vec<LocalizedTransactionTrace>, RpcError> {
        Ok(Vec::new())
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        Ok(*self.block_number.lock())
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64, RpcError> {
        self.block_timestamps.lock().get(&block).copied().ok_or(RpcError::Unmocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, bytes};

    #[tokio::test]
    async fn unconfigured_call_is_unmocked() {
        let mock = MockRpcClient::new();
        let tx = TransactionRequest::default();
        assert!(matches!(mock.call(&tx, None).await, Err(RpcError::Unmocked)));
    }

    #[tokio::test]
    async fn configured_call_returns_canned_value() {
        let mock = MockRpcClient::new();
        let to = address!("0x0000000000000000000000000000000000dEaD");
        mock.set_call(to, None, bytes!("0x2a"));

        let mut tx = TransactionRequest::default();
        tx.to = Some(to.into());
        let result = mock.call(&tx, None).await.unwrap();
        assert_eq!(result, bytes!("0x2a"));
    }
}
