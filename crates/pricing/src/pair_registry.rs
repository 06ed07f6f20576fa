//! Discovers Uniswap-V2-shaped pools for the generic-AMM pricing
//! fallback by indexing a factory's `PairCreated` events, rather than
//! guessing a fixed candidate list up front.
//!
//! Grounded directly on `oracle_filter::LogFilter`/`FilterEngine` — the
//! same incremental catch-up machinery `oracle::watch::LogWatch` drives
//! for the background indexing service, used here by a pricing
//! fallback instead. The log decode itself mirrors the
//! `T::decode_log(&log.inner, true).map(|l| l.data)` pattern used to
//! turn a raw `eth_getLogs` row into a typed event.

use crate::abi::IUniswapV2Factory::PairCreated;
use alloy::primitives::Address;
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use oracle_filter::{FilterEngine, FilterError, LogDiskCache, LogFilter};
use oracle_rpc_client::RpcClient;
use oracle_store::Store;
use oracle_types::Chain;
use std::sync::Arc;

/// An indexed `(pair, other_token)` pool pairing some token of interest
/// with `other_token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    /// The pair contract's address.
    pub pair: Address,
    /// The other token held by this pool.
    pub other: Address,
}

/// Indexes one factory's `PairCreated` history, incrementally, via a
/// [`LogFilter`] over the factory address with a single topic0.
#[derive(Debug, Clone)]
pub struct PairRegistry {
    engine: FilterEngine<Log>,
    source: LogFilter,
    disk_cache: LogDiskCache,
    deployed_at: u64,
}

impl PairRegistry {
    /// Build a registry over `factory`'s `PairCreated` events, never
    /// scanning earlier than `deployed_at`.
    pub fn new(rpc: Arc<dyn RpcClient>, store: Store, chain: Chain, factory: Address, deployed_at: u64) -> Self {
        let topics = vec![PairCreated::SIGNATURE_HASH];
        let source = LogFilter::new(rpc, factory, topics);
        let disk_cache = LogDiskCache::new(store, chain, factory, source.topics_key());
        Self { engine: FilterEngine::new(), source, disk_cache, deployed_at }
    }

    /// Catch the index up to `block`, fetching only the gap since the
    /// last call.
    pub async fn advance_to(&self, block: u64) -> Result<(), FilterError> {
        self.engine.advance_to(&self.source, &self.disk_cache, self.deployed_at, block).await
    }

    /// Every pool discovered so far that pairs `token` with something
    /// else.
    pub fn pools_for(&self, token: Address) -> Vec<Pool> {
        self.engine
            .snapshot()
            .iter()
            .filter_map(|log| {
                let event = PairCreated::decode_log(&log.inner, true).ok()?.data;
                if event.token0 == token {
                    Some(Pool { pair: event.pair, other: event.token1 })
                } else if event.token1 == token {
                    Some(Pool { pair: event.pair, other: event.token0 })
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use oracle_rpc_client::MockRpcClient;
    use oracle_store::Pool as DbPool;

    async fn test_store() -> Store {
        let path = std::env::temp_dir().join(format!("oracle-pricing-pair-registry-test-{}.sqlite", uuid::Uuid::new_v4()));
        let pool = DbPool::connect_sqlite(path.to_str().unwrap()).await.unwrap();
        oracle_store::ensure_schema(&pool).await.unwrap();
        Store::from_pool(pool)
    }

    fn pair_created_log(factory: Address, token0: Address, token1: Address, pair: Address, block: u64) -> Log {
        let event = PairCreated { token0, token1, pair, allPairsLength: Default::default() };
        Log {
            inner: alloy::primitives::Log { address: factory, data: event.encode_log_data() },
            block_hash: None,
            block_number: Some(block),
            block_timestamp: None,
            transaction_hash: Some(alloy::primitives::B256::repeat_byte(0x01)),
            transaction_index: None,
            log_index: Some(0),
            removed: false,
        }
    }

    #[tokio::test]
    async fn registry_finds_pools_pairing_a_token() {
        let chain = Chain::new(1);
        let store = test_store().await;
        store.ensure_chain(chain).await.unwrap();
        let factory = address!("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
        let weth = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        let dai = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");
        let shitcoin = address!("0x0000000000000000000000000000000000dEaD");
        let pair = address!("0x1111111111111111111111111111111111111A");

        let mock = MockRpcClient::new();
        mock.set_logs(vec![pair_created_log(factory, dai, shitcoin, pair, 100)]);
        mock.set_block_number(100);
        let rpc: Arc<dyn RpcClient> = Arc::new(mock);

        let registry = PairRegistry::new(rpc, store, chain, factory, 0);
        registry.advance_to(100).await.unwrap();

        let pools = registry.pools_for(shitcoin);
        assert_eq!(pools, vec![Pool { pair, other: dai }]);
        assert!(registry.pools_for(weth).is_empty());
    }
}
