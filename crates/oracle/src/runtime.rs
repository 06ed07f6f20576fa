use crate::watch::{LogWatch, TraceWatch};
use crate::RuntimeError;
use alloy::primitives::{Address, B256};
use oracle_config::OracleConfig;
use oracle_executors::{Executors, PoolName};
use oracle_filter::{LogDiskCache, LogFilter, TraceDiskCache, TraceFilter};
use oracle_pricing::PriceRouter;
use oracle_rpc_client::{AlloyRpcClient, RpcClient};
use oracle_store::Store;
use oracle_types::{Chain, GetPriceOpts, TokenKey, UsdPrice};
use std::sync::Arc;

/// The assembled oracle process: one [`Store`], one [`RpcClient`], a
/// bounded-pool [`Executors`] registry, and the [`PriceRouter`] built
/// over them. Bound to a single chain for its lifetime.
///
/// Grounded on `init4tech-signet-sdk/crates/rpc/src/ctx.rs`'s `RpcCtx`
/// pattern of a single long-lived struct assembled once at startup from
/// config and handed to every request handler, rather than threading
/// each subsystem separately through the binary.
#[derive(Debug, Clone)]
pub struct Runtime {
    chain: Chain,
    store: Store,
    rpc: Arc<dyn RpcClient>,
    executors: Executors,
    router: PriceRouter,
}

impl Runtime {
    /// Wire up every subsystem from `config`: connect (and migrate) the
    /// store, build the RPC client, and build the price router over
    /// them, all sharing one `Executors` registry so DB, RPC, and
    /// pricing work compete for the same named concurrency budgets.
    pub async fn bootstrap(config: OracleConfig) -> Result<Self, RuntimeError> {
        let executors = Executors::new();
        let pool = match config.db_provider {
            oracle_config::DbProvider::Embedded => oracle_store::Pool::connect_sqlite(&config.sqlite_path).await?,
            oracle_config::DbProvider::Networked => {
                let pg = config.pg.as_ref().ok_or(oracle_store::StoreError::MissingPgConfig)?;
                oracle_store::Pool::connect_postgres(&pg.connection_string()).await?
            }
        };
        oracle_store::ensure_schema(&pool).await?;
        let store = Store::from_pool_with_executors(pool, executors.clone());
        store.ensure_chain(config.chain).await?;
        let rpc: Arc<dyn RpcClient> = Arc::new(AlloyRpcClient::new(config.rpc_url.clone()));
        Ok(Self::new_with_executors(config.chain, store, rpc, config.cache_ttl, executors))
    }

    /// Assemble a runtime directly from its parts, bypassing config
    /// loading. Used by tests and by embedders that already hold an
    /// open `Store`/`RpcClient` (e.g. one shared with another
    /// subsystem). Builds its own `Executors` registry; use
    /// [`Self::new_with_executors`] to share one instead.
    pub fn new(chain: Chain, store: Store, rpc: Arc<dyn RpcClient>, cache_ttl: std::time::Duration) -> Self {
        Self::new_with_executors(chain, store, rpc, cache_ttl, Executors::new())
    }

    /// As [`Self::new`], sharing `executors` with the store and router
    /// instead of giving this runtime's RPC-gated calls their own pool.
    pub fn new_with_executors(
        chain: Chain,
        store: Store,
        rpc: Arc<dyn RpcClient>,
        cache_ttl: std::time::Duration,
        executors: Executors,
    ) -> Self {
        let router = PriceRouter::new(store.clone(), rpc.clone(), chain, cache_ttl);
        Self { chain, store, rpc, executors, router }
    }

    /// The chain this runtime is bound to.
    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// The underlying store, for callers that need direct access (the
    /// `oracle-cli` `db` subcommands).
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The underlying RPC client.
    pub fn rpc(&self) -> &Arc<dyn RpcClient> {
        &self.rpc
    }

    /// Resolve `token`'s USD price at `block`, gated behind the RPC
    /// pool's concurrency budget.
    pub async fn get_price(
        &self,
        token: Address,
        block: u64,
        opts: &GetPriceOpts,
    ) -> Result<UsdPrice, RuntimeError> {
        let _permit = self.executors.acquire(PoolName::Rpc).await;
        let key = TokenKey { chain: self.chain, address: token };
        Ok(self.router.get_price(key, block, opts).await?)
    }

    /// As [`Self::get_price`], honoring `opts.fail_to_none`.
    pub async fn get_price_opt(
        &self,
        token: Address,
        block: u64,
        opts: &GetPriceOpts,
    ) -> Result<Option<UsdPrice>, RuntimeError> {
        let _permit = self.executors.acquire(PoolName::Rpc).await;
        let key = TokenKey { chain: self.chain, address: token };
        Ok(self.router.get_price_opt(key, block, opts).await?)
    }

    /// Build (or resume) a log watch for `address`/`topics`, backed by
    /// this runtime's store for its persisted `[from, thru]` range.
    pub fn watch_logs(&self, address: Address, topics: Vec<B256>) -> LogWatch {
        let source = LogFilter::new(self.rpc.clone(), address, topics);
        let disk_cache = LogDiskCache::new(self.store.clone(), self.chain, address, source.topics_key());
        LogWatch::new(source, disk_cache, self.executors.block_semaphore())
    }

    /// Build (or resume) a trace watch for the given `to`/`from` address
    /// allowlists (either may be empty, meaning "any address").
    pub fn watch_traces(&self, to_addresses: Vec<Address>, from_addresses: Vec<Address>) -> TraceWatch {
        let source = TraceFilter::new(self.rpc.clone(), to_addresses, from_addresses);
        let disk_cache = TraceDiskCache::new(
            self.store.clone(),
            self.chain,
            source.to_addresses_key(),
            source.from_addresses_key(),
        );
        TraceWatch::new(source, disk_cache, self.executors.block_semaphore())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use oracle_config::DbProvider;
    use oracle_rpc_client::MockRpcClient;
    use std::time::Duration;

    async fn test_runtime() -> Runtime {
        let path = std::env::temp_dir().join(format!("oracle-runtime-test-{}.sqlite", uuid::Uuid::new_v4()));
        let config = OracleConfig {
            chain: Chain::new(1),
            rpc_url: url::Url::parse("http://localhost:8545").unwrap(),
            db_provider: DbProvider::Embedded,
            sqlite_path: path.to_str().unwrap().to_owned(),
            pg: None,
            cache_ttl: Duration::from_secs(60),
            contract_cache_ttl: None,
            getlogs_batch_size: 0,
            getlogs_dop: 1,
            checksum_cache_maxsize: 1_000,
            skip_cache: false,
            skip_ypriceapi: true,
            ypriceapi: None,
        };
        let store = Store::connect(&config).await.unwrap();
        let rpc: Arc<dyn RpcClient> = Arc::new(MockRpcClient::new());
        Runtime::new(config.chain, store, rpc, config.cache_ttl)
    }

    #[tokio::test]
    async fn get_price_resolves_a_known_stable() {
        let runtime = test_runtime().await;
        // Mainnet DAI, hardcoded as a stablecoin in oracle-constants.
        let dai = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");
        let price = runtime.get_price(dai, 1, &GetPriceOpts::default()).await.unwrap();
        assert_eq!(price, UsdPrice::ONE);
    }

    #[tokio::test]
    async fn watch_logs_starts_with_an_empty_snapshot() {
        let runtime = test_runtime().await;
        let watch = runtime.watch_logs(Address::ZERO, vec![]);
        assert!(watch.snapshot().is_empty());
        assert_eq!(watch.cached_thru(), None);
    }

    #[tokio::test]
    async fn spawned_watch_catches_up_to_head_and_goes_live() {
        let path = std::env::temp_dir().join(format!("oracle-runtime-test-{}.sqlite", uuid::Uuid::new_v4()));
        let config = OracleConfig {
            chain: Chain::new(1),
            rpc_url: url::Url::parse("http://localhost:8545").unwrap(),
            db_provider: DbProvider::Embedded,
            sqlite_path: path.to_str().unwrap().to_owned(),
            pg: None,
            cache_ttl: Duration::from_secs(60),
            contract_cache_ttl: None,
            getlogs_batch_size: 0,
            getlogs_dop: 1,
            checksum_cache_maxsize: 1_000,
            skip_cache: false,
            skip_ypriceapi: true,
            ypriceapi: None,
        };
        let store = Store::connect(&config).await.unwrap();
        let mock = MockRpcClient::new();
        mock.set_block_number(10);
        let rpc: Arc<dyn RpcClient> = Arc::new(mock);
        let runtime = Runtime::new(config.chain, store, rpc, config.cache_ttl);

        let watch = runtime.watch_logs(Address::ZERO, vec![]);
        let handle = watch.spawn(0, Duration::from_secs(60));

        tokio::time::timeout(Duration::from_secs(2), async {
            while watch.state() != oracle_filter::EngineState::Live {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("watch should catch up and go live");

        assert_eq!(watch.cached_thru(), Some(10));
        handle.cancel();
        handle.join().await.unwrap();
    }
}
