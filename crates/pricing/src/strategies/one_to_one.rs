use crate::{Context, PriceStrategy, RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_constants::ONE_TO_ONE_PEGS;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};

/// Prices a token through a hardcoded one-to-one (or fixed-ratio) peg to
/// another token, skipping any pool or oracle lookup.
///
/// Grounded on `original_source/y/prices/one_to_one.py`.
#[derive(Debug, Clone, Copy)]
pub struct OneToOnePeg;

#[async_trait]
impl PriceStrategy for OneToOnePeg {
    fn bucket(&self) -> Bucket {
        Bucket::OneToOneMap
    }

    async fn probe(&self, _ctx: &Context<'_>, token: TokenKey) -> Result<bool, RouterError> {
        Ok(ONE_TO_ONE_PEGS.iter().any(|p| p.from == token.address))
    }

    async fn price(
        &self,
        ctx: &Context<'_>,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        let peg = ONE_TO_ONE_PEGS
            .iter()
            .find(|p| p.from == token.address)
            .ok_or(RouterError::NoStrategy { token, block })?;
        let guard = guard.descend(token, peg.to)?;
        let underlying = TokenKey { chain: token.chain, address: peg.to };
        ctx.router.get_price_recursive(underlying, block, opts, guard).await
    }
}
