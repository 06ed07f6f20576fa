use alloy::primitives::Address;
use oracle_types::TokenKey;

/// Errors surfaced by [`crate::PriceRouter`].
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// No strategy could price this token.
    #[error("no pricing strategy matched {token} at block {block}")]
    NoStrategy {
        /// The token that could not be priced.
        token: TokenKey,
        /// The block the price was requested at.
        block: u64,
    },
    /// Recursing into an underlying/constituent token exceeded
    /// `oracle_types::MAX_RECURSION_DEPTH`.
    #[error("recursion depth exceeded pricing {token} (reached via {via})")]
    RecursionLimit {
        /// The token whose resolution hit the limit.
        token: TokenKey,
        /// The composite token whose unwrapping triggered the recursion.
        via: Address,
    },
    /// A resolved price exceeded `UsdPrice::SANITY_THRESHOLD` for a
    /// bucket that isn't exempt from the check.
    #[error("price for {token} at block {block} exceeded the sanity threshold")]
    SanityCheckFailed {
        /// The token whose price looked implausible.
        token: TokenKey,
        /// The block the price was requested at.
        block: u64,
    },
    /// A Chainlink feed's `latestTimestamp` is more than 24h behind the
    /// block being priced at.
    #[error("chainlink feed {feed} is stale at block {block}")]
    StaleFeed {
        /// The feed contract.
        feed: Address,
        /// The block the price was requested at.
        block: u64,
    },
    /// The RPC call a strategy needed failed.
    #[error("rpc error: {0}")]
    Rpc(#[from] oracle_rpc_client::RpcError),
    /// Persisting or loading cached state failed.
    #[error("store error: {0}")]
    Store(#[from] oracle_store::StoreError),
    /// The generic-AMM fallback's pool index failed to catch up.
    #[error("pair registry error: {0}")]
    Filter(#[from] oracle_filter::FilterError),
}
