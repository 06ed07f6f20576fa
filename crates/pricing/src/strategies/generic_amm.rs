use crate::abi::IErc20::decimalsCall;
use crate::abi::IUniswapV2Pair::{getReservesCall, token0Call};
use crate::contract::call_view;
use crate::pair_registry::PairRegistry;
use crate::{Context, RecursionGuard, RouterError};
use oracle_types::{GetPriceOpts, TokenKey, UsdPrice};
use rust_decimal::Decimal;

/// Prices `token` off the deepest pool `registry` has indexed for it,
/// under a balanced-reserve constant-product pool's assumption that
/// both sides hold equal USD value: `price(token) = value(other) /
/// amount(token)`.
///
/// This is the "generic AMM price" / "deepest Uniswap-family router (by
/// on-chain reserve depth)" fallback steps collapsed into one, since
/// only Uniswap-V2-shaped factories are modeled here —
/// there is no separate family of router to rank against.
///
/// Unlike [`crate::strategies::UniswapV2Lp`] (which prices an LP token
/// itself off both its reserves), this prices one of a pool's
/// underlying tokens by looking at every pool it appears in.
pub async fn generic_amm_price(
    ctx: &Context<'_>,
    registry: &PairRegistry,
    token: TokenKey,
    block: u64,
    opts: &GetPriceOpts,
    guard: RecursionGuard,
) -> Result<UsdPrice, RouterError> {
    registry.advance_to(block).await?;

    let mut deepest: Option<(Decimal, Decimal)> = None; // (other_value, token_amount)
    for pool in registry.pools_for(token.address) {
        if opts.ignore_pools.contains(&pool.pair) {
            continue;
        }
        let Ok(guard) = guard.descend(token, pool.other) else { continue };

        let other_key = TokenKey { chain: token.chain, address: pool.other };
        let pool_opts = opts.clone().with_ignored_pool(pool.pair);
        let Ok(other_price) = ctx.router.get_price_recursive(other_key, block, &pool_opts, guard).await else {
            continue;
        };

        let Ok(token0) = call_view(ctx.rpc, pool.pair, token0Call {}, block).await else { continue };
        let Ok(reserves) = call_view(ctx.rpc, pool.pair, getReservesCall {}, block).await else { continue };
        let Ok(token_decimals) = call_view(ctx.rpc, token.address, decimalsCall {}, block).await else { continue };
        let Ok(other_decimals) = call_view(ctx.rpc, pool.other, decimalsCall {}, block).await else { continue };

        let (token_reserve, other_reserve) = if token0._0 == token.address {
            (reserves.reserve0, reserves.reserve1)
        } else {
            (reserves.reserve1, reserves.reserve0)
        };

        let token_amount = UsdPrice::scale_by_decimals(Decimal::from(token_reserve.to::<u128>()), token_decimals._0);
        let other_amount = UsdPrice::scale_by_decimals(Decimal::from(other_reserve.to::<u128>()), other_decimals._0);
        if token_amount.is_zero() {
            continue;
        }
        let other_value = (other_price * other_amount).value();

        let replace = match &deepest {
            None => true,
            Some((best_value, _)) => other_value > *best_value,
        };
        if replace {
            deepest = Some((other_value, token_amount));
        }
    }

    let (other_value, token_amount) = deepest.ok_or(RouterError::NoStrategy { token, block })?;
    Ok(UsdPrice::new(other_value / token_amount))
}
