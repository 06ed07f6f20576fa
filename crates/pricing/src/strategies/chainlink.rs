use crate::abi::IChainlinkAggregator::{decimalsCall, latestAnswerCall, latestTimestampCall};
use crate::contract::call_view;
use crate::{Context, RouterError};
use alloy::primitives::Address;
use oracle_types::UsdPrice;
use rust_decimal::Decimal;

/// Past this age a feed's last update is no longer trusted
/// (`latestTimestamp + 24h < block.timestamp`).
const STALENESS_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Reads `latestAnswer` off an `AggregatorV3Interface`-compatible feed
/// at `block` and scales it by the feed's own `decimals`, rejecting the
/// feed if its `latestTimestamp` is more than 24h behind `block`'s own
/// timestamp.
///
/// Both the hardcoded-feed-map path and the on-chain-feed-registry path
/// in [`crate::PriceRouter::resolve`] reduce to these calls, so there's
/// no separate [`crate::PriceStrategy`] impl for this bucket — just this
/// helper, called directly.
///
/// Grounded on `original_source/y/prices/dex/chainlink.py`.
pub async fn chainlink_price(ctx: &Context<'_>, feed: Address, block: u64) -> Result<UsdPrice, RouterError> {
    let decimals = call_view(ctx.rpc, feed, decimalsCall {}, block).await?;
    let answer = call_view(ctx.rpc, feed, latestAnswerCall {}, block).await?;
    let latest_timestamp = call_view(ctx.rpc, feed, latestTimestampCall {}, block).await?._0.to::<u64>();
    let block_timestamp = ctx.rpc.block_timestamp(block).await?;
    if latest_timestamp.saturating_add(STALENESS_WINDOW_SECS) < block_timestamp {
        return Err(RouterError::StaleFeed { feed, block });
    }

    let raw = Decimal::from(answer._0.as_i128());
    Ok(UsdPrice::new(UsdPrice::scale_by_decimals(raw, decimals._0)))
}
