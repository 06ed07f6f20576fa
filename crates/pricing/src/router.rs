use crate::strategies::{
    ExchangeRateWrapped, OneToOnePeg, Stable, UniswapV2Lp, VaultShare, VirtualPriceLp, WrappedNative,
};
use crate::{PairRegistry, PriceStrategy, RecursionGuard, RouterError};
use alloy::primitives::Address;
use oracle_constants::{constants_for_chain, ChainConstants};
use oracle_executors::Memo;
use oracle_rpc_client::RpcClient;
use oracle_store::{PriceRow, Store, TokenRow};
use oracle_types::{Bucket, Chain, GetPriceOpts, TokenKey, UsdPrice};
use std::sync::Arc;
use std::time::Duration;

/// Everything a [`PriceStrategy`] needs to do its job: the RPC client,
/// this chain's hardcoded constants (if any), and a handle back to the
/// router for recursive `get_price` calls on constituent tokens.
#[derive(Debug)]
pub struct Context<'a> {
    /// RPC access for on-chain probes and calls.
    pub rpc: &'a dyn RpcClient,
    /// This chain's hardcoded constants table, if one exists.
    pub constants: Option<&'static ChainConstants>,
    /// The chain being priced on.
    pub chain: Chain,
    /// The router, for strategies that need to recursively price a
    /// constituent token.
    pub router: &'a PriceRouter,
}

/// Dispatches `get_price` requests to the bucket-specific strategy that
/// matches each token, memoizing results and persisting both the
/// detected bucket and the resolved price.
///
/// Grounded on `y.prices.magic.get_price`'s role as the single entry
/// point that tries each pricing module in a fixed order and returns
/// the first success.
#[derive(Debug, Clone)]
pub struct PriceRouter {
    store: Store,
    rpc: Arc<dyn RpcClient>,
    chain: Chain,
    strategies: Arc<Vec<Arc<dyn PriceStrategy>>>,
    memo: Arc<Memo<(Address, u64), UsdPrice>>,
    /// Pool index backing the "generic AMM price" fallback step, if this
    /// chain has a configured Uniswap-V2-shaped factory.
    pair_registry: Option<Arc<PairRegistry>>,
}

impl PriceRouter {
    /// Build a router over the standard strategy set.
    pub fn new(store: Store, rpc: Arc<dyn RpcClient>, chain: Chain, cache_ttl: Duration) -> Self {
        let strategies: Vec<Arc<dyn PriceStrategy>> = vec![
            Arc::new(Stable),
            Arc::new(WrappedNative),
            Arc::new(OneToOnePeg),
            // A hardcoded Chainlink feed map is consulted directly in
            // `resolve_bucket` rather than through a strategy probe,
            // since "has a feed" is a plain table lookup, not an
            // on-chain call.
            Arc::new(ExchangeRateWrapped::new(Bucket::ATokenV1)),
            Arc::new(ExchangeRateWrapped::new(Bucket::ATokenV2)),
            Arc::new(ExchangeRateWrapped::new(Bucket::CToken)),
            Arc::new(ExchangeRateWrapped::new(Bucket::IbToken)),
            Arc::new(VaultShare::new(Bucket::YearnLike)),
            Arc::new(VirtualPriceLp::new(Bucket::CurveLp)),
            Arc::new(VirtualPriceLp::new(Bucket::BalancerLp)),
            Arc::new(VaultShare::new(Bucket::GelatoLp)),
            Arc::new(VaultShare::new(Bucket::UniV3Lp)),
            Arc::new(UniswapV2Lp),
            Arc::new(VaultShare::new(Bucket::PendleLp)),
            Arc::new(VaultShare::new(Bucket::PopsicleLp)),
            Arc::new(VirtualPriceLp::new(Bucket::MstableFeeder)),
            Arc::new(VirtualPriceLp::new(Bucket::SaddleLp)),
            Arc::new(VirtualPriceLp::new(Bucket::EllipsisLp)),
            Arc::new(VirtualPriceLp::new(Bucket::StargateLp)),
            Arc::new(VaultShare::new(Bucket::BasketIndex)),
            Arc::new(VaultShare::new(Bucket::Solidex)),
            Arc::new(VaultShare::new(Bucket::Rkp3r)),
            Arc::new(VaultShare::new(Bucket::VbToken)),
        ];
        let pair_registry = constants_for_chain(chain).and_then(|c| c.uniswap_v2_factory).map(|factory| {
            Arc::new(PairRegistry::new(rpc.clone(), store.clone(), chain, factory.address, factory.deployed_at))
        });
        Self {
            store,
            rpc,
            chain,
            strategies: Arc::new(strategies),
            memo: Arc::new(Memo::new(50_000, Some(cache_ttl))),
            pair_registry,
        }
    }

    /// Resolve `token`'s USD price at `block`.
    pub async fn get_price(
        &self,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
    ) -> Result<UsdPrice, RouterError> {
        self.get_price_inner(token, block, opts, RecursionGuard::new()).await
    }

    /// As [`Self::get_price`], but honors `opts.fail_to_none`: callers
    /// that set it get `None` back for any failure instead of an error.
    pub async fn get_price_opt(
        &self,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
    ) -> Result<Option<UsdPrice>, RouterError> {
        match self.get_price(token, block, opts).await {
            Ok(price) => Ok(Some(price)),
            Err(_) if opts.fail_to_none => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Recursive entry point used by strategies unwrapping a composite
    /// token's constituents.
    pub async fn get_price_recursive(
        &self,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        self.get_price_inner(token, block, opts, guard).await
    }

    async fn get_price_inner(
        &self,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        if !opts.skip_cache {
            if let Some(price) = self.memo.get(&(token.address, block)) {
                return Ok(price);
            }
            if let Some(price) = self.store.get_price(token.chain, token.address, block).await? {
                let price = UsdPrice::from(price);
                self.memo.insert((token.address, block), price);
                return Ok(price);
            }
        }

        let result = self.resolve(token, block, opts, guard).await;

        if let Ok(price) = result {
            self.memo.insert((token.address, block), price);
            if !opts.skip_cache {
                self.store
                    .insert_price(&PriceRow {
                        chain_id: token.chain.id() as i64,
                        token: token.address,
                        block,
                        price: price.value(),
                    })
                    .await?;
            }
        }
        result
    }

    async fn resolve(
        &self,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        let bucket = self.resolve_bucket(token, block).await?;

        let ctx = Context { rpc: self.rpc.as_ref(), constants: constants_for_chain(self.chain), chain: self.chain, router: self };

        match self.resolve_primary(&ctx, bucket, token, block, opts, guard).await {
            Ok(price) => {
                if !bucket.exempt_from_sanity_check() && price.exceeds_sanity_threshold() {
                    return Err(RouterError::SanityCheckFailed { token, block });
                }
                Ok(price)
            }
            Err(primary_err) => match self.resolve_fallback(&ctx, bucket, token, block, opts, guard).await {
                Ok(price) => Ok(price),
                Err(_) => Err(primary_err),
            },
        }
    }

    async fn resolve_primary(
        &self,
        ctx: &Context<'_>,
        bucket: Bucket,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        if let Some(strategy) = self.strategies.iter().find(|s| s.bucket() == bucket) {
            return strategy.price(ctx, token, block, opts, guard).await;
        }

        if bucket == Bucket::ChainlinkFeed {
            if let Some(constants) = ctx.constants {
                if let Some(feed) = constants.chainlink_feed_for(token.address) {
                    return crate::strategies::chainlink_price(ctx, feed, block).await;
                }
            }
        }

        Err(RouterError::NoStrategy { token, block })
    }

    /// Walks the fixed fallback order once the primary
    /// bucket-dispatched strategy has failed: chainlink feed table →
    /// Curve → Balancer → any other bucket whose on-chain probe
    /// matches → generic AMM price (which also stands in for "deepest
    /// Uniswap-family router by reserve depth", since only
    /// Uniswap-V2-shaped factories are modeled here).
    ///
    /// Band/Synthetix and the optional remote oracle would be the next
    /// two steps; neither is implemented — see `DESIGN.md`.
    async fn resolve_fallback(
        &self,
        ctx: &Context<'_>,
        primary_bucket: Bucket,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        if primary_bucket != Bucket::ChainlinkFeed {
            if let Some(constants) = ctx.constants {
                if let Some(feed) = constants.chainlink_feed_for(token.address) {
                    if let Ok(price) = crate::strategies::chainlink_price(ctx, feed, block).await {
                        return Ok(price);
                    }
                }
            }
        }

        for bucket in [Bucket::CurveLp, Bucket::BalancerLp] {
            if bucket == primary_bucket {
                continue;
            }
            if let Some(strategy) = self.strategies.iter().find(|s| s.bucket() == bucket) {
                if strategy.probe(ctx, token).await.unwrap_or(false) {
                    if let Ok(price) = strategy.price(ctx, token, block, opts, guard).await {
                        return Ok(price);
                    }
                }
            }
        }

        for strategy in self.strategies.iter() {
            let bucket = strategy.bucket();
            if bucket == primary_bucket || bucket == Bucket::CurveLp || bucket == Bucket::BalancerLp {
                continue;
            }
            if strategy.probe(ctx, token).await.unwrap_or(false) {
                if let Ok(price) = strategy.price(ctx, token, block, opts, guard).await {
                    return Ok(price);
                }
            }
        }

        if let Some(registry) = &self.pair_registry {
            if let Ok(price) = crate::strategies::generic_amm_price(ctx, registry, token, block, opts, guard).await {
                return Ok(price);
            }
        }

        Err(RouterError::NoStrategy { token, block })
    }

    /// Load a token's previously detected bucket, or probe for one and
    /// persist it. Bucket assignment is probed once and never revisited.
    async fn resolve_bucket(&self, token: TokenKey, block: u64) -> Result<Bucket, RouterError> {
        if let Some(row) = self.store.get_token(token).await? {
            if let Some(bucket) = row.bucket.as_deref().and_then(parse_bucket) {
                return Ok(bucket);
            }
        }

        let ctx = Context { rpc: self.rpc.as_ref(), constants: constants_for_chain(self.chain), chain: self.chain, router: self };

        if let Some(constants) = ctx.constants {
            if constants.chainlink_feed_for(token.address).is_some() {
                self.persist_bucket(token, Bucket::ChainlinkFeed).await?;
                return Ok(Bucket::ChainlinkFeed);
            }
        }

        for bucket in Bucket::PRECEDENCE {
            if let Some(strategy) = self.strategies.iter().find(|s| s.bucket() == *bucket) {
                if strategy.probe(&ctx, token).await? {
                    self.persist_bucket(token, *bucket).await?;
                    return Ok(*bucket);
                }
            }
        }

        self.persist_bucket(token, Bucket::Generic).await?;
        Ok(Bucket::Generic)
    }

    async fn persist_bucket(&self, token: TokenKey, bucket: Bucket) -> Result<(), RouterError> {
        let existing = self.store.get_token(token).await?;
        let row = TokenRow {
            chain_id: token.chain.id() as i64,
            address: token.address,
            symbol: existing.as_ref().and_then(|r| r.symbol.clone()),
            name: existing.as_ref().and_then(|r| r.name.clone()),
            decimals: existing.as_ref().and_then(|r| r.decimals),
            bucket: Some(bucket.to_string()),
        };
        self.store.upsert_token(&row).await?;
        Ok(())
    }
}

fn parse_bucket(s: &str) -> Option<Bucket> {
    Bucket::PRECEDENCE
        .iter()
        .chain(std::iter::once(&Bucket::Generic))
        .find(|b| b.to_string() == s)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use oracle_config::{DbProvider, OracleConfig};
    use oracle_constants::mainnet;
    use oracle_rpc_client::MockRpcClient;
    use std::time::Duration;

    async fn test_router() -> PriceRouter {
        let path = std::env::temp_dir().join(format!("oracle-pricing-test-{}.sqlite", uuid::Uuid::new_v4()));
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
        PriceRouter::new(store, rpc, Chain::new(1), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn stable_token_prices_at_one_dollar() {
        let router = test_router().await;
        let token = TokenKey { chain: Chain::new(1), address: mainnet::DAI };
        let price = router.get_price(token, 1, &GetPriceOpts::default()).await.unwrap();
        assert_eq!(price, UsdPrice::ONE);

        let row = router.store.get_token(token).await.unwrap().unwrap();
        assert_eq!(row.bucket.as_deref(), Some("stable"));
    }

    #[tokio::test]
    async fn unresolvable_token_fails_to_none_when_requested() {
        let router = test_router().await;
        let token = TokenKey { chain: Chain::new(1), address: address!("0x000000000000000000000000000000deadbeef") };
        let opts = GetPriceOpts::default().with_fail_to_none(true);
        assert_eq!(router.get_price_opt(token, 1, &opts).await.unwrap(), None);
    }

    #[tokio::test]
    async fn repeated_lookup_is_served_from_memo() {
        let router = test_router().await;
        let token = TokenKey { chain: Chain::new(1), address: mainnet::DAI };
        let opts = GetPriceOpts::default();
        let first = router.get_price(token, 1, &opts).await.unwrap();
        let second = router.get_price(token, 1, &opts).await.unwrap();
        assert_eq!(first, second);
    }
}
