use crate::strategies::chainlink::chainlink_price;
use crate::{Context, PriceStrategy, RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};

/// Prices the chain's wrapped-native-gas-coin token (WETH, WMATIC, ...)
/// through its Chainlink feed, same as any other Chainlink-fed asset —
/// it's detected separately only because its address is already known
/// ahead of any probe.
///
/// Grounded on `original_source/y/constants.py`'s per-chain
/// `WRAPPED_GAS_COIN` constant.
#[derive(Debug, Clone, Copy)]
pub struct WrappedNative;

#[async_trait]
impl PriceStrategy for WrappedNative {
    fn bucket(&self) -> Bucket {
        Bucket::WrappedNative
    }

    async fn probe(&self, ctx: &Context<'_>, token: TokenKey) -> Result<bool, RouterError> {
        Ok(ctx.constants.is_some_and(|c| c.wrapped_native == token.address))
    }

    async fn price(
        &self,
        ctx: &Context<'_>,
        token: TokenKey,
        block: u64,
        _opts: &GetPriceOpts,
        _guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        let feed = ctx
            .constants
            .and_then(|c| c.chainlink_feed_for(token.address))
            .ok_or(RouterError::NoStrategy { token, block })?;
        chainlink_price(ctx, feed, block).await
    }
}
