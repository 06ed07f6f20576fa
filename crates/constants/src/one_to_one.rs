use alloy::primitives::{address, Address};

/// A hardcoded one-to-one peg: `from` is priced as `scale * price(to)`.
///
/// Grounded on `original_source/ypricemagic/price_modules/wsteth.py` and
/// `y/prices/one_to_one.py`, which special-case tokens whose price tracks
/// another token's price at a fixed (non-unity, for wstETH) or unity
/// (for renBTC-style wrapped tokens) ratio rather than through a pool or
/// oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneToOnePeg {
    /// The composite/wrapped token.
    pub from: Address,
    /// The underlying token it is priced through.
    pub to: Address,
}

/// Mainnet one-to-one pegs known ahead of any on-chain probe.
pub const ONE_TO_ONE_PEGS: &[OneToOnePeg] = &[
    // renBTC -> WBTC
    OneToOnePeg {
        from: address!("0xEB4C2781e4ebA804CE9a9803C67d0893436bB27D"),
        to: super::mainnet::WBTC,
    },
];
