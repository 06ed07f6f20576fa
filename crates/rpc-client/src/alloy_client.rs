use crate::{RpcClient, RpcError};
use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::ext::TraceApi;
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::trace::filter::TraceFilter;
use alloy::rpc::types::trace::parity::LocalizedTransactionTrace;
use alloy::rpc::types::{Block, Filter, Log, TransactionRequest};
use async_trait::async_trait;

/// An [`RpcClient`] backed by a live `alloy` HTTP provider.
#[derive(Debug, Clone)]
pub struct AlloyRpcClient {
    provider: RootProvider,
}

impl AlloyRpcClient {
    /// Build a client over `url`.
    pub fn new(url: url::Url) -> Self {
        Self { provider: ProviderBuilder::new().disable_recommended_fillers().connect_http(url) }
    }

    fn block_id(block: Option<u64>) -> BlockId {
        block.map(BlockId::number).unwrap_or(BlockId::Number(BlockNumberOrTag::Latest))
    }
}

#[async_trait]
impl RpcClient for AlloyRpcClient {
    async fn call(&self, tx: &TransactionRequest, block: Option<u64>) -> Result<Bytes, RpcError> {
        self.provider
            .call(tx.clone())
            .block(Self::block_id(block))
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, RpcError> {
        self.provider.get_logs(filter).await.map_err(|e| RpcError::Transport(e.to_string()))
    }

    async fn get_code(&self, address: Address, block: Option<u64>) -> Result<Bytes, RpcError> {
        self.provider
            .get_code_at(address)
            .block_id(Self::block_id(block))
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))
    }

    async fn get_block_by_number(&self, block: u64) -> Result<Option<Block>, RpcError> {
        self.provider
            .get_block_by_number(BlockNumberOrTag::Number(block))
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))
    }

    async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: Option<u64>,
    ) -> Result<B256, RpcError> {
        let value = self
            .provider
            .get_storage_at(address, slot)
            .block_id(Self::block_id(block))
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(B256::from(value))
    }

    async fn trace_filter(
        &self,
        filter: &TraceFilter,
    ) -> Result<Vec<LocalizedTransactionTrace>, RpcError> {
        self.provider.trace_filter(filter).await.map_err(|e| RpcError::Transport(e.to_string()))
    }

    async fn trace_block(&self, block: u64) -> Result<Vec<LocalizedTransactionTrace>, RpcError> {
        self.provider
            .trace_block(BlockId::Number(BlockNumberOrTag::Number(block)))
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        self.provider.get_block_number().await.map_err(|e| RpcError::Transport(e.to_string()))
    }

    async fn block_timestamp(&self, block: u64) -> Result<u64, RpcError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block))
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?
            .ok_or_else(|| RpcError::Transport(format!("block {block} not found")))?;
        Ok(block.header.timestamp)
    }
}
