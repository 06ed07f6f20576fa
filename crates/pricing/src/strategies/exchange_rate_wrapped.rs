use crate::abi::IExchangeRateVault::{exchangeRateStoredCall, underlyingCall};
use crate::contract::call_view;
use crate::{Context, PriceStrategy, RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};
use rust_decimal::Decimal;

/// Prices a lending-market wrapped asset (Compound-style cTokens,
/// Aave-style aTokens, Iron Bank ibTokens) as `exchangeRate *
/// price(underlying)`.
///
/// These three protocol families expose the same shape of accessor —
/// a scaled exchange rate against one unit of the underlying asset —
/// so one generic strategy serves all three buckets it's constructed
/// with, rather than one near-identical impl per protocol.
///
/// Grounded on `original_source/y/prices/lending/compound.py` and
/// `original_source/y/prices/lending/aave.py`.
#[derive(Debug, Clone, Copy)]
pub struct ExchangeRateWrapped {
    bucket: Bucket,
}

impl ExchangeRateWrapped {
    /// Build an instance serving `bucket`. `bucket` must be one of
    /// `ATokenV1`, `ATokenV2`, `CToken`, or `IbToken`.
    pub const fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl PriceStrategy for ExchangeRateWrapped {
    fn bucket(&self) -> Bucket {
        self.bucket
    }

    async fn probe(&self, ctx: &Context<'_>, token: TokenKey) -> Result<bool, RouterError> {
        Ok(call_view(ctx.rpc, token.address, exchangeRateStoredCall {}, 0).await.is_ok()
            && call_view(ctx.rpc, token.address, underlyingCall {}, 0).await.is_ok())
    }

    async fn price(
        &self,
        ctx: &Context<'_>,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        let rate = call_view(ctx.rpc, token.address, exchangeRateStoredCall {}, block).await?._0;
        let underlying = call_view(ctx.rpc, token.address, underlyingCall {}, block).await?._0;

        let guard = guard.descend(token, underlying)?;
        let underlying_key = TokenKey { chain: token.chain, address: underlying };
        let underlying_price = ctx.router.get_price_recursive(underlying_key, block, opts, guard).await?;

        // Exchange rates are scaled by 1e18 across all three protocol
        // families this strategy serves.
        let scaled_rate = UsdPrice::scale_by_decimals(Decimal::from(rate.to::<u128>()), 18);
        Ok(underlying_price * scaled_rate)
    }
}
