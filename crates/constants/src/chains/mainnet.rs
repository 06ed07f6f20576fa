//! Constants for Ethereum Mainnet (chain id 1).

use crate::chains::{ChainConstants, ChainlinkFeed, StableToken, UniswapV2Factory};
use alloy::primitives::address;

/// USDC.
pub const USDC: alloy::primitives::Address = address!("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
/// USDT.
pub const USDT: alloy::primitives::Address = address!("0xdAC17F958D2ee523a2206206994597C13D831ec7");
/// DAI.
pub const DAI: alloy::primitives::Address = address!("0x6B175474E89094C44Da98b954EedeAC495271d0F");
/// WETH9.
pub const WETH: alloy::primitives::Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
/// WBTC.
pub const WBTC: alloy::primitives::Address = address!("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");
/// LINK.
pub const LINK: alloy::primitives::Address = address!("0x514910771AF9Ca656af840dff83E8264EcF986CA");
/// Chainlink's LINK/USD aggregator.
pub const LINK_USD_FEED: alloy::primitives::Address =
    address!("0x2c1d072e956AFFC0D435Cb7AC38EF18d24d9127c");
/// Chainlink's ETH/USD aggregator.
pub const ETH_USD_FEED: alloy::primitives::Address =
    address!("0x5f4eC3Df9cbd43714FE2740f5E3616155c5b8419");
/// The canonical Uniswap V2 factory.
pub const UNISWAP_V2_FACTORY: alloy::primitives::Address =
    address!("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");
/// Block the Uniswap V2 factory was deployed at.
pub const UNISWAP_V2_FACTORY_DEPLOYED_AT: u64 = 10_000_835;

const STABLES: &[StableToken] = &[
    StableToken { address: USDC, symbol: "USDC" },
    StableToken { address: USDT, symbol: "USDT" },
    StableToken { address: DAI, symbol: "DAI" },
];

const HIGH_PRICE_ALLOWLIST: &[alloy::primitives::Address] = &[WETH, WBTC];

const CHAINLINK_FEEDS: &[ChainlinkFeed] = &[
    ChainlinkFeed { token: LINK, feed: LINK_USD_FEED },
    ChainlinkFeed { token: WETH, feed: ETH_USD_FEED },
];

/// The constants table for Mainnet.
pub const CONSTANTS: ChainConstants = ChainConstants {
    stables: STABLES,
    wrapped_native: WETH,
    high_price_allowlist: HIGH_PRICE_ALLOWLIST,
    chainlink_feeds: CHAINLINK_FEEDS,
    uniswap_v2_factory: Some(UniswapV2Factory {
        address: UNISWAP_V2_FACTORY,
        deployed_at: UNISWAP_V2_FACTORY_DEPLOYED_AT,
    }),
};
