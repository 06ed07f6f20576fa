use crate::{RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};

/// One pricing mechanic: detect whether it applies to a token, and
/// resolve that token's price if so.
///
/// Each bucket in `oracle_types::Bucket` is served by exactly one
/// strategy, but several buckets that share the same underlying
/// mechanic (a virtual-price stableswap invariant, an exchange-rate
/// wrapped asset, a share-price vault) are served by the *same*
/// strategy instance configured differently, rather than by one
/// near-identical implementation per protocol family — mirroring how
/// `y.prices` groups its modules by mechanic (`dex/uniswap`, `lending`,
/// `stable_swap`) rather than by every individual fork.
#[async_trait]
pub trait PriceStrategy: Send + Sync + std::fmt::Debug {
    /// Which bucket this strategy serves.
    fn bucket(&self) -> Bucket;

    /// Cheap, on-chain or cached probe for whether `token` belongs to
    /// this strategy's bucket. Called in `Bucket::PRECEDENCE` order the
    /// first time a token is seen; the winning bucket is then persisted
    /// and never re-probed.
    async fn probe(&self, ctx: &crate::Context<'_>, token: TokenKey) -> Result<bool, RouterError>;

    /// Resolve `token`'s USD price at `block`. `guard` must be passed to
    /// any recursive `ctx.router.get_price` call this strategy makes
    /// while unwrapping a composite token, and `opts` must be threaded
    /// into that same call (deriving from it, e.g. via
    /// `opts.clone().with_ignored_pool(..)`, rather than starting from a
    /// fresh `GetPriceOpts::default()`) so a caller's `skip_cache`/
    /// `fail_to_none`/`ignore_pools` survive the unwrap.
    async fn price(
        &self,
        ctx: &crate::Context<'_>,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError>;
}
