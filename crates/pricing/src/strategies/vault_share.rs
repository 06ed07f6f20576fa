use crate::abi::IVaultShare::{pricePerShareCall, tokenCall};
use crate::contract::call_view;
use crate::{Context, PriceStrategy, RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};
use rust_decimal::Decimal;

/// Prices a share-price vault token (Yearn-like vaults, Gelato/Arrakis
/// and Popsicle LP wrappers, Pendle LP, and the handful of other
/// single-underlying share tokens) as `pricePerShare *
/// price(underlying)`.
///
/// All of these reduce to "one share is worth a fixed, on-chain-queried
/// multiple of one underlying token", which is also how ERC4626's
/// `convertToAssets` behaves, so one strategy serves every bucket it's
/// constructed with.
///
/// Grounded on `original_source/y/prices/vaults/yearn.py`.
#[derive(Debug, Clone, Copy)]
pub struct VaultShare {
    bucket: Bucket,
}

impl VaultShare {
    /// Build an instance serving `bucket`.
    pub const fn new(bucket: Bucket) -> Self {
        Self { bucket }
    }
}

#[async_trait]
impl PriceStrategy for VaultShare {
    fn bucket(&self) -> Bucket {
        self.bucket
    }

    async fn probe(&self, ctx: &Context<'_>, token: TokenKey) -> Result<bool, RouterError> {
        Ok(call_view(ctx.rpc, token.address, pricePerShareCall {}, 0).await.is_ok()
            && call_view(ctx.rpc, token.address, tokenCall {}, 0).await.is_ok())
    }

    async fn price(
        &self,
        ctx: &Context<'_>,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        let price_per_share = call_view(ctx.rpc, token.address, pricePerShareCall {}, block).await?._0;
        let underlying = call_view(ctx.rpc, token.address, tokenCall {}, block).await?._0;

        let guard = guard.descend(token, underlying)?;
        let underlying_key = TokenKey { chain: token.chain, address: underlying };
        let underlying_price = ctx.router.get_price_recursive(underlying_key, block, opts, guard).await?;

        let scaled = UsdPrice::scale_by_decimals(Decimal::from(price_per_share.to::<u128>()), 18);
        Ok(underlying_price * scaled)
    }
}
