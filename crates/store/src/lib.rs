//! Persistence for cached on-chain history and resolved prices.
//!
//! The schema covers chains, blocks, addresses/contracts,
//! tokens, prices, and the `LogCacheInfo`/`TraceCacheInfo` range-cache
//! metadata tables that let the filter engine answer "do I already have
//! `[fromBlock, toBlock]` cached" without re-querying the chain. Both
//! SQLite (embedded, default) and Postgres (networked) are supported
//! through the same `Store` surface; the two backends only differ in
//! DDL dialect and upsert syntax, both handled internally.

#![warn(
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    rustdoc::all
)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use, rust_2018_idioms)]

mod error;
pub use error::StoreError;

mod retry;
pub use retry::retry_locked;

mod schema;
pub use schema::ensure_schema;

mod pool;
pub use pool::Pool;

mod cache_info;
pub use cache_info::{LogCacheInfo, TraceCacheInfo};

mod price;
pub use price::PriceRow;

mod token;
pub use token::TokenRow;

mod block;
pub use block::BlockRow;

mod log;
pub use log::{LogRow, TraceRow};

use alloy::primitives::Address;
use oracle_config::{DbProvider, OracleConfig};
use oracle_executors::{Executors, PoolName};
use oracle_types::{Chain, TokenKey};
use rust_decimal::Decimal;

/// A handle to the oracle's persistent store.
///
/// Cheap to clone: it wraps a connection pool (`sqlx` pools are
/// internally reference-counted) and an [`Executors`] registry (also
/// reference-counted) whose `DbRead`/`DbWrite` pools every method below
/// routes through — no path reaches `self.pool` without first taking a
/// permit, so a caller can't bypass the concurrency budget by holding a
/// `Store` handle directly.
#[derive(Debug, Clone)]
pub struct Store {
    pool: Pool,
    executors: Executors,
}

impl Store {
    /// Open (and, if necessary, migrate) the store described by `config`.
    pub async fn connect(config: &OracleConfig) -> Result<Self, StoreError> {
        let pool = match config.db_provider {
            DbProvider::Embedded => Pool::connect_sqlite(&config.sqlite_path).await?,
            DbProvider::Networked => {
                let pg = config.pg.as_ref().ok_or(StoreError::MissingPgConfig)?;
                Pool::connect_postgres(&pg.connection_string()).await?
            }
        };
        schema::ensure_schema(&pool).await?;
        Ok(Self { pool, executors: Executors::new() })
    }

    /// Build a store directly over an already-open pool. Used by tests
    /// and by callers that want to share a pool with other subsystems.
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool, executors: Executors::new() }
    }

    /// Build a store that shares `executors` with the rest of the
    /// process, so DB work competes for the same named budgets as RPC
    /// and pricing work rather than getting an unbounded pool of its
    /// own.
    pub fn from_pool_with_executors(pool: Pool, executors: Executors) -> Self {
        Self { pool, executors }
    }

    async fn read<F, Fut, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let _permit = self.executors.acquire(PoolName::DbRead).await;
        f().await
    }

    async fn write<F, Fut, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let _permit = self.executors.acquire(PoolName::DbWrite).await;
        retry_locked(f).await
    }

    /// Record that `chain` exists, if it is not already known.
    pub async fn ensure_chain(&self, chain: Chain) -> Result<(), StoreError> {
        self.write(|| async { self.pool.insert_or_ignore_chain(chain.id() as i64).await }).await
    }

    /// Look up cached metadata about `token`, if any row exists.
    pub async fn get_token(&self, token: TokenKey) -> Result<Option<TokenRow>, StoreError> {
        self.read(|| async { self.pool.select_token(token.chain.id() as i64, token.address).await }).await
    }

    /// Insert or update a token's metadata.
    pub async fn upsert_token(&self, row: &TokenRow) -> Result<(), StoreError> {
        self.write(|| async { self.pool.upsert_token(row).await }).await
    }

    /// Look up a previously persisted price for `token` at `block`.
    pub async fn get_price(
        &self,
        chain: Chain,
        token: Address,
        block: u64,
    ) -> Result<Option<Decimal>, StoreError> {
        self.read(|| async { self.pool.select_price(chain.id() as i64, token, block as i64).await }).await
    }

    /// Persist a single resolved price. Equivalent to `bulk_insert_prices`
    /// with one row, provided for callers that don't batch.
    pub async fn insert_price(&self, row: &PriceRow) -> Result<(), StoreError> {
        self.bulk_insert_prices(std::slice::from_ref(row)).await
    }

    /// Insert many resolved prices in one transaction, skipping rows that
    /// already exist (idempotent replay of a block range is a no-op).
    pub async fn bulk_insert_prices(&self, rows: &[PriceRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.write(|| async { self.pool.bulk_insert_prices(rows).await }).await
    }

    /// Fetch the cached `[from, thru]` log range for `(chain, address,
    /// topics)`, if one has ever been recorded.
    pub async fn get_log_cache_info(
        &self,
        chain: Chain,
        address: Address,
        topics_key: &[u8],
    ) -> Result<Option<LogCacheInfo>, StoreError> {
        self.read(|| async { self.pool.select_log_cache_info(chain.id() as i64, address, topics_key).await }).await
    }

    /// Record (or extend) the cached log range for `(chain, address,
    /// topics)`.
    pub async fn set_log_cache_info(&self, info: &LogCacheInfo) -> Result<(), StoreError> {
        self.write(|| async { self.pool.upsert_log_cache_info(info).await }).await
    }

    /// Fetch the cached `[from, thru]` trace range for `(chain, to, from)`
    /// address filters, if one has ever been recorded.
    pub async fn get_trace_cache_info(
        &self,
        chain: Chain,
        to_addresses: &[u8],
        from_addresses: &[u8],
    ) -> Result<Option<TraceCacheInfo>, StoreError> {
        self.read(|| async {
            self.pool.select_trace_cache_info(chain.id() as i64, to_addresses, from_addresses).await
        })
        .await
    }

    /// Record (or extend) the cached trace range for `(chain, to, from)`.
    pub async fn set_trace_cache_info(&self, info: &TraceCacheInfo) -> Result<(), StoreError> {
        self.write(|| async { self.pool.upsert_trace_cache_info(info).await }).await
    }

    /// Record that `address` exists on `chain`.
    pub async fn ensure_address(&self, chain: Chain, address: Address) -> Result<(), StoreError> {
        self.write(|| async { self.pool.ensure_address(chain.id() as i64, address).await }).await
    }

    /// Record that `address` is a contract on `chain`, optionally noting
    /// its deployment block.
    pub async fn ensure_contract(
        &self,
        chain: Chain,
        address: Address,
        deploy_block: Option<u64>,
    ) -> Result<(), StoreError> {
        self.write(|| async { self.pool.ensure_contract(chain.id() as i64, address, deploy_block).await }).await
    }

    /// Insert or update a block's identity.
    pub async fn upsert_block(&self, row: &BlockRow) -> Result<(), StoreError> {
        self.write(|| async { self.pool.upsert_block(row).await }).await
    }

    /// Look up a previously persisted block header.
    pub async fn get_block(&self, chain: Chain, number: u64) -> Result<Option<BlockRow>, StoreError> {
        self.read(|| async { self.pool.select_block(chain.id() as i64, number).await }).await
    }

    /// Record the block that was current at `timestamp`, for the
    /// binary-search-by-timestamp lookup strategies use.
    pub async fn set_block_at_timestamp(
        &self,
        chain: Chain,
        timestamp: u64,
        block_number: u64,
    ) -> Result<(), StoreError> {
        self.write(|| async {
            self.pool.set_block_at_timestamp(chain.id() as i64, timestamp, block_number).await
        })
        .await
    }

    /// Look up the block recorded as current at `timestamp`.
    pub async fn get_block_at_timestamp(&self, chain: Chain, timestamp: u64) -> Result<Option<u64>, StoreError> {
        self.read(|| async { self.pool.get_block_at_timestamp(chain.id() as i64, timestamp).await }).await
    }

    /// Insert every log in `rows`, skipping any that already exist.
    pub async fn bulk_insert_logs(&self, rows: &[LogRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.write(|| async { self.pool.bulk_insert_logs(rows).await }).await
    }

    /// Every persisted log matching `filter_key` in `[from, to]`.
    pub async fn get_logs_by_filter_key(
        &self,
        chain: Chain,
        filter_key: &[u8],
        from: u64,
        to: u64,
    ) -> Result<Vec<LogRow>, StoreError> {
        self.read(|| async { self.pool.select_logs_by_filter_key(chain.id() as i64, filter_key, from, to).await })
            .await
    }

    /// Insert every trace in `rows`.
    pub async fn bulk_insert_traces(&self, rows: &[TraceRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.write(|| async { self.pool.bulk_insert_traces(rows).await }).await
    }

    /// Every persisted trace matching `filter_key` in `[from, to]`.
    pub async fn get_traces_by_filter_key(
        &self,
        chain: Chain,
        filter_key: &[u8],
        from: u64,
        to: u64,
    ) -> Result<Vec<TraceRow>, StoreError> {
        self.read(|| async { self.pool.select_traces_by_filter_key(chain.id() as i64, filter_key, from, to).await })
            .await
    }

    /// Delete cached prices (and, when scoped by token, the token row
    /// itself) matching `target`. Used by `oracle-cli db clear`. Returns
    /// the number of price rows removed.
    pub async fn clear(&self, chain: Chain, target: ClearTarget<'_>) -> Result<u64, StoreError> {
        let chain_id = chain.id() as i64;
        self.write(|| async {
            match &target {
                ClearTarget::Address(addr) => self.pool.clear_prices_for_token(chain_id, *addr).await,
                ClearTarget::Symbol(symbol) => self.pool.clear_prices_for_symbol(chain_id, symbol).await,
                ClearTarget::Block(block) => self.pool.clear_prices_for_block(chain_id, *block as i64).await,
            }
        })
        .await
    }

    /// Drop every cached row. Used by `oracle-cli db nuke`.
    pub async fn nuke(&self) -> Result<(), StoreError> {
        self.write(|| async { self.pool.nuke().await }).await
    }

    /// Reclaim disk space (SQLite `VACUUM`; a no-op on Postgres, which
    /// autovacuums). Used by `oracle-cli db vacuum`.
    pub async fn vacuum(&self) -> Result<(), StoreError> {
        self.write(|| async { self.pool.vacuum().await }).await
    }

    /// Row counts per table, for `oracle-cli db info`.
    pub async fn info(&self) -> Result<StoreInfo, StoreError> {
        self.read(|| async { self.pool.info().await }).await
    }

    /// Expose the underlying pool for subsystems (the filter engine's
    /// `DiskCache`) that need lower-level access.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

/// What `Store::clear` scopes its deletion to. Exactly one variant is
/// used per call — `oracle-cli db clear` requires the caller to pick
/// either a token (by address or symbol) or a block, never both.
#[derive(Debug, Clone, Copy)]
pub enum ClearTarget<'a> {
    /// Every cached price for the token at this address, plus its token
    /// row.
    Address(Address),
    /// Every cached price for the token with this symbol (case
    /// insensitive), plus its token row.
    Symbol(&'a str),
    /// Every cached price at this block, across all tokens.
    Block(u64),
}

/// Summary counts reported by `oracle-cli db info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreInfo {
    /// Number of distinct chains with any cached data.
    pub chains: i64,
    /// Number of cached tokens.
    pub tokens: i64,
    /// Number of cached prices.
    pub prices: i64,
    /// Number of cached log-range entries.
    pub log_caches: i64,
    /// Number of cached trace-range entries.
    pub trace_caches: i64,
    /// Number of cached logs.
    pub logs: i64,
    /// Number of cached traces.
    pub traces: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> Store {
        let path = std::env::temp_dir().join(format!("oracle-store-test-{}.sqlite", uuid::Uuid::new_v4()));
        let pool = Pool::connect_sqlite(path.to_str().unwrap()).await.unwrap();
        schema::ensure_schema(&pool).await.unwrap();
        Store::from_pool(pool)
    }

    #[tokio::test]
    async fn token_round_trips() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();

        let token = TokenKey { chain, address: Address::repeat_byte(0x11) };
        assert!(store.get_token(token).await.unwrap().is_none());

        let row = TokenRow {
            chain_id: 1,
            address: token.address,
            symbol: Some("WETH".to_owned()),
            name: Some("Wrapped Ether".to_owned()),
            decimals: Some(18),
            bucket: Some("wrapped-native".to_owned()),
        };
        store.upsert_token(&row).await.unwrap();

        let fetched = store.get_token(token).await.unwrap().unwrap();
        assert_eq!(fetched.symbol.as_deref(), Some("WETH"));
        assert_eq!(fetched.decimals, Some(18));
    }

    #[tokio::test]
    async fn bulk_insert_prices_is_idempotent() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();
        let token = Address::repeat_byte(0x22);

        let row = PriceRow { chain_id: 1, token, block: 100, price: Decimal::new(2500, 0) };
        store.bulk_insert_prices(&[row]).await.unwrap();
        // Replaying the same range must not error or change the value.
        store.bulk_insert_prices(&[row]).await.unwrap();

        let price = store.get_price(chain, token, 100).await.unwrap().unwrap();
        assert_eq!(price, Decimal::new(2500, 0));
        assert!(store.get_price(chain, token, 101).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn log_cache_info_extends_range() {
        let store = test_store().await;
        let chain = Chain::new(1);
        let address = Address::repeat_byte(0x33);
        let topics_key = b"topic-fingerprint".to_vec();

        store
            .set_log_cache_info(&LogCacheInfo {
                chain_id: 1,
                address,
                topics_key: topics_key.clone(),
                cached_from: 100,
                cached_thru: 200,
            })
            .await
            .unwrap();
        store
            .set_log_cache_info(&LogCacheInfo {
                chain_id: 1,
                address,
                topics_key: topics_key.clone(),
                cached_from: 50,
                cached_thru: 250,
            })
            .await
            .unwrap();

        let info = store.get_log_cache_info(chain, address, &topics_key).await.unwrap().unwrap();
        assert_eq!(info.cached_from, 50);
        assert_eq!(info.cached_thru, 250);
    }

    #[tokio::test]
    async fn clear_by_address_removes_prices_and_token() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();
        let token = Address::repeat_byte(0x44);
        store
            .upsert_token(&TokenRow {
                chain_id: 1,
                address: token,
                symbol: Some("FOO".to_owned()),
                name: None,
                decimals: Some(18),
                bucket: None,
            })
            .await
            .unwrap();
        store
            .bulk_insert_prices(&[PriceRow { chain_id: 1, token, block: 100, price: Decimal::ONE }])
            .await
            .unwrap();

        let deleted = store.clear(chain, ClearTarget::Address(token)).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.get_price(chain, token, 100).await.unwrap().is_none());
        assert!(store.get_token(TokenKey { chain, address: token }).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_by_block_leaves_other_blocks_untouched() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();
        let token = Address::repeat_byte(0x55);
        store
            .bulk_insert_prices(&[
                PriceRow { chain_id: 1, token, block: 100, price: Decimal::ONE },
                PriceRow { chain_id: 1, token, block: 101, price: Decimal::ONE },
            ])
            .await
            .unwrap();

        let deleted = store.clear(chain, ClearTarget::Block(100)).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.get_price(chain, token, 100).await.unwrap().is_none());
        assert!(store.get_price(chain, token, 101).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn block_round_trips() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();

        assert!(store.get_block(chain, 100).await.unwrap().is_none());

        let hash = alloy::primitives::B256::repeat_byte(0xaa);
        store
            .upsert_block(&BlockRow { chain_id: 1, number: 100, hash: Some(hash), timestamp: Some(1_700_000_000) })
            .await
            .unwrap();

        let fetched = store.get_block(chain, 100).await.unwrap().unwrap();
        assert_eq!(fetched.hash, Some(hash));
        assert_eq!(fetched.timestamp, Some(1_700_000_000));

        store.set_block_at_timestamp(chain, 1_700_000_000, 100).await.unwrap();
        assert_eq!(store.get_block_at_timestamp(chain, 1_700_000_000).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn logs_round_trip_by_filter_key() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();

        let address = Address::repeat_byte(0x66);
        let topic0 = alloy::primitives::B256::repeat_byte(0x01);
        let filter_key = b"fingerprint".to_vec();
        let row = LogRow {
            chain_id: 1,
            block_number: 100,
            tx_hash: alloy::primitives::B256::repeat_byte(0x02),
            log_index: 0,
            address,
            topics: vec![topic0],
            filter_key: filter_key.clone(),
            raw: b"raw-log".to_vec(),
        };
        store.bulk_insert_logs(&[row.clone()]).await.unwrap();
        // Replaying the same row must not error or duplicate it.
        store.bulk_insert_logs(&[row]).await.unwrap();

        let fetched = store.get_logs_by_filter_key(chain, &filter_key, 0, 200).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].address, address);
        assert_eq!(fetched[0].topics, vec![topic0]);
        assert_eq!(fetched[0].raw, b"raw-log");

        assert!(store.get_logs_by_filter_key(chain, &filter_key, 200, 300).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traces_round_trip_by_filter_key() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();

        let to = Address::repeat_byte(0x77);
        let filter_key = b"trace-fingerprint".to_vec();
        let row = TraceRow {
            chain_id: 1,
            block_number: 100,
            tx_hash: Some(alloy::primitives::B256::repeat_byte(0x03)),
            from_address: None,
            to_address: Some(to),
            filter_key: filter_key.clone(),
            raw: b"raw-trace".to_vec(),
        };
        store.bulk_insert_traces(&[row]).await.unwrap();

        let fetched = store.get_traces_by_filter_key(chain, &filter_key, 0, 200).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].to_address, Some(to));
        assert_eq!(fetched[0].from_address, None);
        assert_eq!(fetched[0].raw, b"raw-trace");
    }

    #[tokio::test]
    async fn info_counts_rows() {
        let store = test_store().await;
        let chain = Chain::new(1);
        store.ensure_chain(chain).await.unwrap();
        let info = store.info().await.unwrap();
        assert_eq!(info.chains, 1);
        assert_eq!(info.prices, 0);
    }
}
