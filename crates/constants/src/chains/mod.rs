pub mod mainnet;

use alloy::primitives::Address;

/// A stablecoin priced at a flat `$1` regardless of block, plus its token
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableToken {
    /// The stablecoin's address.
    pub address: Address,
    /// The stablecoin's symbol, for logging.
    pub symbol: &'static str,
}

/// A hardcoded Chainlink USD feed, used when the feed registry has not
/// (yet) indexed a `FeedConfirmed` event for this token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainlinkFeed {
    /// The priced token.
    pub token: Address,
    /// The `AggregatorV3Interface`-compatible feed contract.
    pub feed: Address,
}

/// A Uniswap-V2-shaped factory, used by the generic-AMM pricing
/// fallback to discover pools for an otherwise-unpriceable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniswapV2Factory {
    /// The factory contract's address.
    pub address: Address,
    /// The block the factory was deployed at — the fallback's
    /// `PairCreated` index never needs to scan earlier than this.
    pub deployed_at: u64,
}

/// The constants table for a single chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainConstants {
    /// Stablecoins priced at a flat `$1`.
    pub stables: &'static [StableToken],
    /// The wrapped-native-gas-coin token substituted for the EEE sentinel
    /// on chains where the gas coin has no ERC-20 representation.
    pub wrapped_native: Address,
    /// Tokens exempt from the router's high-price sanity check
    /// because large per-unit USD values are expected there.
    pub high_price_allowlist: &'static [Address],
    /// Hardcoded Chainlink feed map, consulted alongside the on-chain
    /// feed registry.
    pub chainlink_feeds: &'static [ChainlinkFeed],
    /// The primary Uniswap-V2-shaped factory on this chain, if one is
    /// configured, for the generic-AMM pricing fallback.
    pub uniswap_v2_factory: Option<UniswapV2Factory>,
}

impl ChainConstants {
    /// True if `address` is a configured stablecoin.
    pub fn is_stable(&self, address: Address) -> bool {
        self.stables.iter().any(|s| s.address == address)
    }

    /// True if `address` is exempt from the high-price sanity check.
    pub fn is_high_price_allowed(&self, address: Address) -> bool {
        self.high_price_allowlist.contains(&address)
    }

    /// Look up a hardcoded Chainlink feed for `token`.
    pub fn chainlink_feed_for(&self, token: Address) -> Option<Address> {
        self.chainlink_feeds.iter().find(|f| f.token == token).map(|f| f.feed)
    }
}
