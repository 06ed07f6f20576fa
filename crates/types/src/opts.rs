use alloy::primitives::Address;
use std::collections::HashSet;

/// Options threaded through `PriceRouter::get_price` and down into
/// strategies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetPriceOpts {
    /// Bypass the `Price` memo and recompute even if a cached value
    /// exists.
    pub skip_cache: bool,
    /// Pools a liquidity-pool strategy must not reuse when recursing into
    /// a paired token. Prevents a pool from pricing itself via its own
    /// paired-token recursion.
    pub ignore_pools: HashSet<Address>,
    /// If true, any unresolved price (including recursion-guard trips)
    /// returns `None` instead of a `PriceError`.
    pub fail_to_none: bool,
}

impl GetPriceOpts {
    /// The default options: cache enabled, no ignored pools, errors
    /// propagate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: bypass the cache.
    pub fn with_skip_cache(mut self, skip_cache: bool) -> Self {
        self.skip_cache = skip_cache;
        self
    }

    /// Builder: fail to `None` rather than propagating `PriceError`.
    pub fn with_fail_to_none(mut self, fail_to_none: bool) -> Self {
        self.fail_to_none = fail_to_none;
        self
    }

    /// Builder: add a pool to the ignore set, returning a derived options
    /// value. Used when a strategy recurses into a paired token so the
    /// same pool cannot be reused for that recursive call.
    pub fn with_ignored_pool(mut self, pool: Address) -> Self {
        self.ignore_pools.insert(pool);
        self
    }
}
