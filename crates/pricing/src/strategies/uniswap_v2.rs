use crate::abi::IErc20::{decimalsCall, totalSupplyCall};
use crate::abi::IUniswapV2Pair::{getReservesCall, token0Call, token1Call};
use crate::contract::call_view;
use crate::{Context, PriceStrategy, RecursionGuard, RouterError};
use async_trait::async_trait;
use oracle_types::{Bucket, GetPriceOpts, TokenKey, UsdPrice};
use rust_decimal::Decimal;

/// Prices a Uniswap V2 (and fork) LP token as the sum of each reserve's
/// USD value, divided across the pair's own total supply.
///
/// Grounded on `original_source/y/prices/dex/uniswap/v2.py`'s
/// `LiquidityPool.get_price`.
#[derive(Debug, Clone, Copy)]
pub struct UniswapV2Lp;

#[async_trait]
impl PriceStrategy for UniswapV2Lp {
    fn bucket(&self) -> Bucket {
        Bucket::UniV2Lp
    }

    async fn probe(&self, ctx: &Context<'_>, token: TokenKey) -> Result<bool, RouterError> {
        Ok(call_view(ctx.rpc, token.address, token0Call {}, 0).await.is_ok()
            && call_view(ctx.rpc, token.address, token1Call {}, 0).await.is_ok())
    }

    async fn price(
        &self,
        ctx: &Context<'_>,
        token: TokenKey,
        block: u64,
        opts: &GetPriceOpts,
        guard: RecursionGuard,
    ) -> Result<UsdPrice, RouterError> {
        let pair = token.address;
        let token0 = call_view(ctx.rpc, pair, token0Call {}, block).await?._0;
        let token1 = call_view(ctx.rpc, pair, token1Call {}, block).await?._0;
        let reserves = call_view(ctx.rpc, pair, getReservesCall {}, block).await?;
        let supply = call_view(ctx.rpc, pair, totalSupplyCall {}, block).await?._0;
        let decimals0 = call_view(ctx.rpc, token0, decimalsCall {}, block).await?._0;
        let decimals1 = call_view(ctx.rpc, token1, decimalsCall {}, block).await?._0;

        let guard0 = guard.descend(token, token0)?;
        let guard1 = guard.descend(token, token1)?;
        let pair_opts = opts.clone().with_ignored_pool(pair);

        let key0 = TokenKey { chain: token.chain, address: token0 };
        let key1 = TokenKey { chain: token.chain, address: token1 };
        let price0 = ctx.router.get_price_recursive(key0, block, &pair_opts, guard0).await;
        let price1 = ctx.router.get_price_recursive(key1, block, &pair_opts, guard1).await;

        let amount0 = UsdPrice::scale_by_decimals(Decimal::from(reserves.reserve0.to::<u128>()), decimals0);
        let amount1 = UsdPrice::scale_by_decimals(Decimal::from(reserves.reserve1.to::<u128>()), decimals1);

        // If only one side's price resolves (the other token is itself
        // unpriceable, e.g. an airdrop-only shitcoin with no strategy),
        // extrapolate from the known side rather than failing the whole
        // LP: in a balanced-reserve AMM the two sides hold equal USD
        // value, so one side's value doubled approximates the pool's
        // total value.
        let total_value = match (price0, price1) {
            (Ok(price0), Ok(price1)) => price0 * amount0 + price1 * amount1,
            (Ok(price0), Err(_)) => (price0 * amount0) * Decimal::from(2),
            (Err(_), Ok(price1)) => (price1 * amount1) * Decimal::from(2),
            (Err(e), Err(_)) => return Err(e),
        };

        if supply.is_zero() {
            return Ok(UsdPrice::ZERO);
        }
        let supply_decimal = UsdPrice::scale_by_decimals(Decimal::from(supply.to::<u128>()), 18);
        Ok(UsdPrice::new(total_value.value() / supply_decimal))
    }
}
