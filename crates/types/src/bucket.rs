/// A coarse classification tag for a token's pricing strategy.
///
/// Bucket assignment has a fixed precedence (the order `matches` is
/// attempted in `oracle-pricing`'s router); ties are broken by first
/// match. Once assigned, a token's bucket is persisted on its `Token`
/// row and never re-probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Bucket {
    /// A known stablecoin, priced at a flat `$1`.
    Stable,
    /// The wrapped-native-gas-coin token (WETH, WMATIC, ...).
    WrappedNative,
    /// A token with a registered Chainlink USD feed.
    ChainlinkFeed,
    /// A Uniswap-V2-shaped (or fork) LP token.
    UniV2Lp,
    /// A Uniswap-V3-shaped (or fork) LP position.
    UniV3Lp,
    /// A Curve stableswap/cryptoswap LP token.
    CurveLp,
    /// A Balancer v1 or v2 pool token.
    BalancerLp,
    /// A Yearn-like vault share.
    YearnLike,
    /// An Aave v1-style aToken.
    ATokenV1,
    /// An Aave v2/v3-style aToken.
    ATokenV2,
    /// A Compound-family cToken.
    CToken,
    /// An Iron Bank-style interest-bearing token.
    IbToken,
    /// A Pendle LP token.
    PendleLp,
    /// A Gelato Uniswap-V3 vault share.
    GelatoLp,
    /// A Popsicle vault share.
    PopsicleLp,
    /// An mStable feeder-pool LP token.
    MstableFeeder,
    /// A Saddle stableswap LP token.
    SaddleLp,
    /// An Ellipsis LP token.
    EllipsisLp,
    /// A Stargate LP token.
    StargateLp,
    /// A basket/index token (BasketDAO, PieDAO, ...).
    BasketIndex,
    /// A Solidex staking-receipt token.
    Solidex,
    /// The RKP3R staking-receipt token.
    Rkp3r,
    /// A vbToken (vote-escrowed basket share).
    VbToken,
    /// A token with a hardcoded one-to-one peg to another priceable token.
    OneToOneMap,
    /// No specific bucket matched; priced via fallback strategies.
    Generic,
}

impl Bucket {
    /// True for buckets that are exempt from the router's high-price
    /// sanity check because large per-unit USD values are expected.
    pub const fn exempt_from_sanity_check(self) -> bool {
        matches!(self, Self::UniV2Lp | Self::UniV3Lp | Self::YearnLike)
    }

    /// The fixed precedence order bucket detection is attempted in.
    /// Earlier entries are checked first; the first on-chain probe that
    /// matches wins.
    pub const PRECEDENCE: &'static [Self] = &[
        Self::Stable,
        Self::WrappedNative,
        Self::OneToOneMap,
        Self::ChainlinkFeed,
        Self::ATokenV1,
        Self::ATokenV2,
        Self::CToken,
        Self::IbToken,
        Self::YearnLike,
        Self::CurveLp,
        Self::BalancerLp,
        Self::UniV3Lp,
        Self::UniV2Lp,
        Self::PendleLp,
        Self::GelatoLp,
        Self::PopsicleLp,
        Self::MstableFeeder,
        Self::SaddleLp,
        Self::EllipsisLp,
        Self::StargateLp,
        Self::BasketIndex,
        Self::Solidex,
        Self::Rkp3r,
        Self::VbToken,
    ];
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Stable => "stable",
            Self::WrappedNative => "wrapped-native",
            Self::ChainlinkFeed => "chainlink-feed",
            Self::UniV2Lp => "uni-v2-lp",
            Self::UniV3Lp => "uni-v3-lp",
            Self::CurveLp => "curve-lp",
            Self::BalancerLp => "balancer-lp",
            Self::YearnLike => "yearn-like",
            Self::ATokenV1 => "atoken-v1",
            Self::ATokenV2 => "atoken-v2",
            Self::CToken => "ctoken",
            Self::IbToken => "ib-token",
            Self::PendleLp => "pendle-lp",
            Self::GelatoLp => "gelato-lp",
            Self::PopsicleLp => "popsicle-lp",
            Self::MstableFeeder => "mstable-feeder",
            Self::SaddleLp => "saddle-lp",
            Self::EllipsisLp => "ellipsis-lp",
            Self::StargateLp => "stargate-lp",
            Self::BasketIndex => "basket-index",
            Self::Solidex => "solidex",
            Self::Rkp3r => "rkp3r",
            Self::VbToken => "vb-token",
            Self::OneToOneMap => "one-to-one-map",
            Self::Generic => "generic",
        };
        f.write_str(s)
    }
}
