use crate::abi::IVirtualPriceLp::get_virtual_priceCall;
use crate::contract::call_view;
use crate::{Context, PriceStrategy, RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};
use rust_decimal::Decimal;

/// Prices a stableswap-invariant LP token (Curve, Saddle, Ellipsis,
/// Stargate, mStable feeder pools) directly off its own
/// `get_virtual_price`, which each of these protocols already reports
/// in USD-equivalent terms for one LP share — no constituent-token
/// recursion needed.
///
/// Grounded on `original_source/y/prices/dex/curve/pool.py`'s
/// `CurvePool.virtual_price` usage.
#[derive(Debug, Clone, Copy)]
pub struct VirtualPriceLp {
    bucket: Bucket,
}

impl VirtualPriceLp {
    /// Build an instance serving `bucket`.
    pub const fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl PriceStrategy for VirtualPriceLp {
    fn bucket(&self) -> Bucket {
        self.bucket
    }

    async fn probe(&self, ctx: &Context<'_>, token: TokenKey) -> Result<bool, RouterError> {
        Ok(call_view(ctx.rpc, token.address, get_virtual_priceCall {}, 0).await.is_ok())
    }

    async fn price(
        &self,
        ctx: &Context<'_>,
        token: TokenKey,
        block: u64,
        _opts: &GetPriceOpts,
        _guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        let virtual_price = call_view(ctx.rpc, token.address, get_virtual_priceCall {}, block).await?._0;
        Ok(UsdPrice::new(UsdPrice::scale_by_decimals(Decimal::from(virtual_price.to::<u128>()), 18)))
    }
}
