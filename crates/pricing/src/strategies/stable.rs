use crate::{Context, PriceStrategy, RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};

/// Prices a known stablecoin at a flat `$1`, skipping any on-chain
/// lookup entirely.
///
/// Grounded on `original_source/y/constants.py`'s `STABLECOINS` table
/// and its zero-RPC short-circuit in `y.prices.magic.get_price`.
#[derive(Debug, Clone, Copy)]
pub struct Stable;

#[async_trait]
impl PriceStrategy for Stable {
    fn bucket(&self) -> Bucket {
        Bucket::Stable
    }

    async fn probe(&self, ctx: &Context<'_>, token: TokenKey) -> Result<bool, RouterError> {
        Ok(ctx.constants.is_some_and(|c| c.is_stable(token.address)))
    }

    async fn price(
        &self,
        _ctx: &Context<'_>,
        _token: TokenKey,
        _block: u64,
        _opts: &GetPriceOpts,
        _guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        Ok(UsdPrice::ONE)
    }
}
